// 卸载：释放捕获表，重新注册原始特化方法，恢复全部符号 hook
use super::MutexPoisonRecover;
use super::jni_entry::OLD_JNI_REGISTER_NATIVE_METHODS;
use super::state::GLOBAL;
use crate::errno::Errno;
use crate::jni_env::{JniEnv, env_from_vm};
use crate::log;
use crate::natives::{ZYGOTE_CLASS, restore_batch};
use jni_sys::{JNI_VERSION_1_6, JavaVM};
use std::ffi::{CString, c_int};
use std::mem;

pub(super) fn unhook_functions() -> Errno {
    let mut core = GLOBAL.core.lock_or_poison();
    if !core.installed {
        log::warn(format_args!("hook: nothing to unhook"));
        return Errno::Uninit;
    }

    let Some(env) = (unsafe { env_from_vm(core.java_vm as *mut JavaVM, JNI_VERSION_1_6) }) else {
        log::error(format_args!("hook: failed to get JNIEnv"));
        return Errno::NoEnv;
    };

    // 整块释放，不逐条析构
    if let Some(capture) = core.capture.take() {
        capture.release();
    }
    let replaced = mem::take(&mut core.replaced);
    drop(core);

    if !replaced.is_empty() && !reregister_originals(&env, &replaced) {
        log::error(format_args!("hook: failed to register JNI hook"));
        // 替换记录放回，重试时再次注册原方法
        GLOBAL.core.lock_or_poison().replaced = replaced;
        return Errno::JniRestore;
    }
    drop(replaced);

    let mut core = GLOBAL.core.lock_or_poison();
    if let Some(table) = core.jni_table.take() {
        unsafe { table.restore(&env) };
    }
    core.class_name.release(&env);
    if let Some(vtable) = core.vtable.take() {
        vtable.release();
    }

    let restored = core
        .registry
        .as_mut()
        .is_none_or(|registry| registry.uninstall_all());
    if !restored {
        return Errno::Restore;
    }

    core.registry = None;
    core.hide = None;
    core.installed = false;
    log::info(format_args!("hook: unhooked"));
    Errno::Ok
}

fn reregister_originals(env: &JniEnv, replaced: &[crate::natives::ReplacedMethod]) -> bool {
    let Some(register) = OLD_JNI_REGISTER_NATIVE_METHODS.get() else {
        log::error(format_args!("hook: original jniRegisterNativeMethods missing"));
        return false;
    };
    let Ok(class_name) = CString::new(ZYGOTE_CLASS) else {
        return false;
    };
    let batch = restore_batch(replaced);
    let ret = unsafe {
        register(
            env.raw(),
            class_name.as_ptr(),
            batch.as_ptr(),
            batch.len() as c_int,
        )
    };
    ret == 0
}

// 隐藏进程中的自卸载；卸载失败时不调用卸载回调，避免代码被卸载后仍有 hook 指向它
pub(super) fn self_unload() {
    log::debug(format_args!("hook: request to self unload"));
    let unloader = GLOBAL.core.lock_or_poison().unloader;
    let status = unhook_functions();
    if !status.is_ok() {
        log::error(format_args!("hook: self unload aborted: {status:?}"));
        return;
    }
    GLOBAL.core.lock_or_poison().unloader = None;
    if let Some(unloader) = unloader {
        unsafe { unloader() };
    }
}
