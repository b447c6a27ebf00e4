// AndroidRuntime::setArgv0 与 onVmCreated 跳板
// setArgv0 早于 JavaVM 创建执行，借它替换虚表以获得 onVmCreated 时机
use super::MutexPoisonRecover;
use super::jni_entry::{OLD_ENV_REGISTER_NATIVES, new_env_register_natives};
use super::state::GLOBAL;
use crate::bridge::{JniTableOverride, OnVmCreatedFn, SetArgv0Fn, VtableOverride};
use crate::jni_env::JniEnv;
use crate::log;
use crate::plt::OrigSlot;
use jni_sys::JNIEnv;
use std::ffi::{c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

pub(super) static OLD_SET_ARGV0: OrigSlot<SetArgv0Fn> = OrigSlot::new();
static OLD_ON_VM_CREATED: OrigSlot<OnVmCreatedFn> = OrigSlot::new();
// AppRuntime 是进程级单例，只替换一次
static SWIZZLED: AtomicBool = AtomicBool::new(false);

pub(super) fn reset() {
    SWIZZLED.store(false, Ordering::Release);
    OLD_ON_VM_CREATED.set_raw(ptr::null_mut());
}

pub(super) unsafe extern "C" fn new_set_argv0(
    this: *mut c_void,
    argv0: *const c_char,
    set_proc_name: bool,
) {
    if !SWIZZLED.swap(true, Ordering::AcqRel) {
        log::debug(format_args!("hook: AndroidRuntime::setArgv0"));
        match VtableOverride::acquire(this, new_on_vm_created) {
            Some((guard, previous)) => {
                OLD_ON_VM_CREATED.set_raw(previous.map_or(ptr::null_mut(), |f| f as *mut c_void));
                GLOBAL.core.lock_or_poison().vtable = Some(guard);
            }
            None => log::error(format_args!("hook: AppRuntime vtable unavailable")),
        }
    }

    if let Some(set_argv0) = OLD_SET_ARGV0.get() {
        set_argv0(this, argv0, set_proc_name);
    }
}

unsafe extern "C" fn new_on_vm_created(this: *mut c_void, env: *mut JNIEnv) {
    log::debug(format_args!("hook: AppRuntime::onVmCreated"));

    // 先恢复原虚表并释放副本
    let guard = GLOBAL.core.lock_or_poison().vtable.take();
    if let Some(guard) = guard {
        guard.release();
    }

    match JniEnv::from_raw(env) {
        Some(jni) => match JniTableOverride::install(&jni, new_env_register_natives) {
            Some(table) => {
                OLD_ENV_REGISTER_NATIVES.set_raw(
                    table
                        .original_register_natives()
                        .map_or(ptr::null_mut(), |f| f as *mut c_void),
                );
                GLOBAL.core.lock_or_poison().jni_table = Some(table);
            }
            None => log::error(format_args!("hook: JNIEnv function table unavailable")),
        },
        None => log::error(format_args!("hook: onVmCreated without JNIEnv")),
    }

    match OLD_ON_VM_CREATED.get() {
        Some(on_vm_created) => on_vm_created(this, env),
        None => log::warn(format_args!("hook: original onVmCreated missing")),
    }
}
