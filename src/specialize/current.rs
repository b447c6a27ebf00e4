// 供 fork / selinux_android_setcontext 符号 hook 读取的在途上下文投影
// 这两个 hook 运行在原 native 方法内部，此时不能持有全局状态锁
use libc::pid_t;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static ACTIVE: AtomicBool = AtomicBool::new(false);
static PID: AtomicI32 = AtomicI32::new(0);
static DO_HIDE: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Published {
    pub(crate) pid: pid_t,
    pub(crate) do_hide: bool,
}

pub(crate) fn publish(value: Option<Published>) {
    match value {
        Some(value) => {
            PID.store(value.pid, Ordering::Relaxed);
            DO_HIDE.store(value.do_hide, Ordering::Relaxed);
            ACTIVE.store(true, Ordering::Release);
        }
        None => {
            ACTIVE.store(false, Ordering::Release);
            PID.store(0, Ordering::Relaxed);
            DO_HIDE.store(false, Ordering::Relaxed);
        }
    }
}

pub(crate) fn current() -> Option<Published> {
    if !ACTIVE.load(Ordering::Acquire) {
        return None;
    }
    Some(Published {
        pid: PID.load(Ordering::Relaxed),
        do_hide: DO_HIDE.load(Ordering::Relaxed),
    })
}
