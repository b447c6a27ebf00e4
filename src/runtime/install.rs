// 安装：在 libandroid_runtime 上登记进程级符号 hook
// jniRegisterNativeMethods 未被使用时改走 app_process 的 setArgv0 虚表跳板
use super::MutexPoisonRecover;
use super::bridge_entry::{self, OLD_SET_ARGV0, new_set_argv0};
use super::jni_entry::{
    JniRegisterNativeMethodsFn, OLD_ENV_REGISTER_NATIVES, OLD_JNI_REGISTER_NATIVE_METHODS,
    new_jni_register_native_methods,
};
use super::process_hooks::{
    ForkFn, OLD_FORK, OLD_SELINUX_ANDROID_SETCONTEXT, SelinuxSetcontextFn, new_fork,
    new_selinux_android_setcontext,
};
use super::state::{GLOBAL, SelfUnloadFn};
use crate::bridge::SetArgv0Fn;
use crate::config::Config;
use crate::errno::Errno;
use crate::hide::{HideClient, HideDaemon};
use crate::log;
use crate::natives::CaptureTable;
use crate::plt::{HookRegistry, OrigSlot, SymbolPatcher};
use crate::version;
use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

// android::AndroidRuntime::setArgv0(const char *, bool)
const SET_ARGV0_SYMBOL: &str = "_ZN7android14AndroidRuntime8setArgv0EPKcb";
// android::AndroidRuntime::registerNativeMethods(_JNIEnv*, const char *, const JNINativeMethod *, int)
const REGISTER_NATIVE_METHODS_SYMBOL: &str =
    "_ZN7android14AndroidRuntime21registerNativeMethodsEP7_JNIEnvPKcPK15JNINativeMethodi";

pub(super) fn hook_functions(
    config: Config,
    patcher: Box<dyn SymbolPatcher>,
    daemon: Box<dyn HideDaemon>,
    unloader: Option<SelfUnloadFn>,
) -> Errno {
    let mut core = GLOBAL.core.lock_or_poison();
    if core.installed {
        return Errno::Repeat;
    }
    log::set_debug_enabled(config.debug);
    reset_slots();

    let mut registry = HookRegistry::new(patcher);
    let runtime_library = config.runtime_library.as_str();
    let status = install_or_log(
        &mut registry,
        runtime_library,
        "fork",
        new_fork as ForkFn as *mut c_void,
        &OLD_FORK,
    )
    .and_then(|()| {
        install_or_log(
            &mut registry,
            runtime_library,
            "selinux_android_setcontext",
            new_selinux_android_setcontext as SelinuxSetcontextFn as *mut c_void,
            &OLD_SELINUX_ANDROID_SETCONTEXT,
        )
    })
    .and_then(|()| {
        install_or_log(
            &mut registry,
            runtime_library,
            "jniRegisterNativeMethods",
            new_jni_register_native_methods as JniRegisterNativeMethodsFn as *mut c_void,
            &OLD_JNI_REGISTER_NATIVE_METHODS,
        )
    });
    if let Err(err) = status {
        return err;
    }
    registry.commit();
    registry.prune();

    if !OLD_JNI_REGISTER_NATIVE_METHODS.is_resolved() {
        log::debug(format_args!("hook: jniRegisterNativeMethods not used"));
        if let Err(err) = install_or_log(
            &mut registry,
            &config.app_process,
            SET_ARGV0_SYMBOL,
            new_set_argv0 as SetArgv0Fn as *mut c_void,
            &OLD_SET_ARGV0,
        ) {
            return err;
        }
        registry.commit();
        registry.prune();

        // 卸载时仍需以直接链接路径重新注册原始方法
        let register = registry.lookup_symbol(REGISTER_NATIVE_METHODS_SYMBOL);
        if register.is_null() {
            log::warn(format_args!(
                "hook: {REGISTER_NATIVE_METHODS_SYMBOL} not found"
            ));
        }
        OLD_JNI_REGISTER_NATIVE_METHODS.set_raw(register);
    }

    log::info(format_args!(
        "{} installed {} symbol hooks",
        version::version_str_full(),
        registry.len()
    ));
    core.registry = Some(registry);
    core.capture = Some(CaptureTable::new());
    core.replaced.clear();
    core.hide = Some(Arc::new(HideClient::new(daemon)));
    core.unloader = unloader;
    core.installed = true;
    Errno::Ok
}

// 单个符号登记失败只降级为“未 hook”，路径规则非法则中止安装
fn install_or_log<F: Copy>(
    registry: &mut HookRegistry,
    path_regex: &str,
    symbol: &str,
    new_func: *mut c_void,
    slot: &'static OrigSlot<F>,
) -> Result<(), Errno> {
    match registry.install(path_regex, symbol, new_func, slot) {
        Ok(()) => Ok(()),
        Err(Errno::InvalidArg) => Err(Errno::InvalidArg),
        Err(err) => {
            log::warn(format_args!("hook: \"{symbol}\" not hooked: {err:?}"));
            Ok(())
        }
    }
}

fn reset_slots() {
    OLD_FORK.set_raw(ptr::null_mut());
    OLD_SELINUX_ANDROID_SETCONTEXT.set_raw(ptr::null_mut());
    OLD_JNI_REGISTER_NATIVE_METHODS.set_raw(ptr::null_mut());
    OLD_ENV_REGISTER_NATIVES.set_raw(ptr::null_mut());
    OLD_SET_ARGV0.set_raw(ptr::null_mut());
    bridge_entry::reset();
}
