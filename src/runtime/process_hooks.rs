// libandroid_runtime 中 fork 与 selinux_android_setcontext 的替换
use super::state::GLOBAL;
use super::MutexPoisonRecover;
use crate::log;
use crate::plt::OrigSlot;
use crate::specialize;
use libc::{c_char, c_int, pid_t, uid_t};

pub(super) type ForkFn = unsafe extern "C" fn() -> pid_t;
pub(super) type SelinuxSetcontextFn = unsafe extern "C" fn(
    uid: uid_t,
    is_system_server: c_int,
    seinfo: *const c_char,
    pkgname: *const c_char,
) -> c_int;

pub(super) static OLD_FORK: OrigSlot<ForkFn> = OrigSlot::new();
pub(super) static OLD_SELINUX_ANDROID_SETCONTEXT: OrigSlot<SelinuxSetcontextFn> = OrigSlot::new();

// 特化调用进行中时，原方法内部的 fork 直接拿到本层已经 fork 出的 pid
pub(super) unsafe extern "C" fn new_fork() -> pid_t {
    match specialize::current() {
        Some(published) => published.pid,
        None => real_fork(),
    }
}

// 未解析到 libandroid_runtime 的 fork 绑定时退回 libc
pub(super) unsafe fn real_fork() -> pid_t {
    match OLD_FORK.get() {
        Some(fork) => fork(),
        None => libc::fork(),
    }
}

// 切换 SELinux 上下文后守护进程 socket 不可达，必须在此之前通知隐藏
pub(super) unsafe extern "C" fn new_selinux_android_setcontext(
    uid: uid_t,
    is_system_server: c_int,
    seinfo: *const c_char,
    pkgname: *const c_char,
) -> c_int {
    if specialize::current().is_some_and(|published| published.do_hide) {
        let hide = GLOBAL.core.lock_or_poison().hide.clone();
        if let Some(hide) = hide {
            hide.notify_self_hide();
        }
    }
    match OLD_SELINUX_ANDROID_SETCONTEXT.get() {
        Some(setcontext) => setcontext(uid, is_system_server, seinfo, pkgname),
        None => {
            log::error(format_args!("hook: selinux_android_setcontext original missing"));
            -1
        }
    }
}
