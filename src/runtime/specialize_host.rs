// 状态机宿主能力的真实实现
use super::MutexPoisonRecover;
use super::process_hooks::real_fork;
use super::state::GLOBAL;
use super::teardown;
use crate::jni_env::JniEnv;
use crate::log;
use crate::specialize::{self, Published, SpecializeArgs, SpecializeHost};
use jni_sys::{JNIEnv, jint};
use libc::{c_int, pid_t};
use std::ptr;

pub(crate) struct RuntimeHost {
    env: Option<JniEnv>,
}

impl RuntimeHost {
    pub(crate) unsafe fn new(env: *mut JNIEnv) -> Self {
        Self {
            env: JniEnv::from_raw(env),
        }
    }
}

impl SpecializeHost for RuntimeHost {
    fn fork(&mut self) -> pid_t {
        unsafe { real_fork() }
    }

    fn block_sigchld(&mut self, block: bool) {
        let how = if block {
            libc::SIG_BLOCK
        } else {
            libc::SIG_UNBLOCK
        };
        if sigmask(how, libc::SIGCHLD) != 0 {
            log::warn(format_args!("hook: sigprocmask(SIGCHLD) failed"));
        }
    }

    fn process_name(&mut self, args: &SpecializeArgs) -> Option<String> {
        let SpecializeArgs::App(args) = args else {
            return None;
        };
        self.env?.string_utf(args.nice_name)
    }

    fn should_hide(&mut self, uid: jint, process_name: &str) -> bool {
        let hide = GLOBAL.core.lock_or_poison().hide.clone();
        hide.is_some_and(|hide| hide.should_hide(uid, process_name))
    }

    fn restore_env_table(&mut self) {
        let Some(env) = self.env else {
            return;
        };
        let mut core = GLOBAL.core.lock_or_poison();
        if !core
            .jni_table
            .as_ref()
            .is_some_and(|table| table.is_active_on(&env))
        {
            return;
        }
        if let Some(table) = core.jni_table.take() {
            unsafe { table.restore(&env) };
        }
        core.class_name.release(&env);
        log::debug(format_args!("hook: JNIEnv function table restored"));
    }

    fn self_unload(&mut self) {
        teardown::self_unload();
    }

    fn publish(&mut self, published: Option<Published>) {
        specialize::publish(published);
    }
}

fn sigmask(how: c_int, signum: c_int) -> c_int {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, signum);
        libc::sigprocmask(how, &set, ptr::null_mut())
    }
}
