// 两条 native 方法注册路径的入口：JNIEnv->RegisterNatives 与 jniRegisterNativeMethods
use super::MutexPoisonRecover;
use super::state::{CoreState, GLOBAL};
use crate::bridge::RegisterNativesFn;
use crate::jni_env::JniEnv;
use crate::log;
use crate::natives::{hook_and_save_methods, select_batch};
use crate::plt::OrigSlot;
use crate::specialize::zygote_targets;
use jni_sys::{JNI_ERR, JNIEnv, JNINativeMethod, jclass, jint};
use std::ffi::{CStr, c_char, c_int};
use std::slice;

pub(super) type JniRegisterNativeMethodsFn = unsafe extern "C" fn(
    env: *mut JNIEnv,
    class_name: *const c_char,
    methods: *const JNINativeMethod,
    num_methods: c_int,
) -> c_int;

pub(super) static OLD_JNI_REGISTER_NATIVE_METHODS: OrigSlot<JniRegisterNativeMethodsFn> =
    OrigSlot::new();
// 替换表恢复之后仍需可用
pub(super) static OLD_ENV_REGISTER_NATIVES: OrigSlot<RegisterNativesFn> = OrigSlot::new();

// 保存 JavaVM，捕获整批方法，必要时返回替换后的副本
unsafe fn intercept(
    env: &JniEnv,
    class_name: &str,
    methods: *const JNINativeMethod,
    count: c_int,
) -> Option<Vec<JNINativeMethod>> {
    let mut core = GLOBAL.core.lock_or_poison();
    if !core.installed {
        return None;
    }
    if core.java_vm == 0 {
        if let Some(vm) = env.java_vm() {
            core.java_vm = vm as usize;
        }
    }
    if methods.is_null() || count <= 0 {
        return None;
    }

    let batch = slice::from_raw_parts(methods, count as usize);
    let CoreState {
        capture, replaced, ..
    } = &mut *core;
    let capture = capture.as_mut()?;
    hook_and_save_methods(capture, replaced, zygote_targets(), class_name, batch)
}

pub(super) unsafe extern "system" fn new_env_register_natives(
    env: *mut JNIEnv,
    clazz: jclass,
    methods: *const JNINativeMethod,
    num_methods: jint,
) -> jint {
    let jni = JniEnv::from_raw(env);
    // 解析类名要回调 Java，先把缓存取出再解析
    let mut cache = GLOBAL.core.lock_or_poison().class_name;
    let class_name = jni.and_then(|jni| cache.resolve(&jni, clazz));
    GLOBAL.core.lock_or_poison().class_name = cache;

    let new_methods = match (jni, class_name.as_deref()) {
        (Some(jni), Some(class_name)) => {
            log::debug(format_args!("hook: JNIEnv->RegisterNatives {class_name}"));
            intercept(&jni, class_name, methods, num_methods)
        }
        _ => {
            log::warn(format_args!(
                "hook: JNIEnv->RegisterNatives class unresolved, forwarding untouched"
            ));
            None
        }
    };

    let Some(register) = OLD_ENV_REGISTER_NATIVES.get() else {
        log::error(format_args!("hook: original RegisterNatives missing"));
        return JNI_ERR;
    };
    register(
        env,
        clazz,
        select_batch(methods, new_methods.as_ref()),
        num_methods,
    )
}

pub(super) unsafe extern "C" fn new_jni_register_native_methods(
    env: *mut JNIEnv,
    class_name: *const c_char,
    methods: *const JNINativeMethod,
    num_methods: c_int,
) -> c_int {
    let name = (!class_name.is_null()).then(|| CStr::from_ptr(class_name).to_string_lossy());
    let new_methods = match (JniEnv::from_raw(env), name.as_deref()) {
        (Some(jni), Some(name)) => {
            log::debug(format_args!("hook: jniRegisterNativeMethods {name}"));
            intercept(&jni, name, methods, num_methods)
        }
        _ => None,
    };

    let Some(register) = OLD_JNI_REGISTER_NATIVE_METHODS.get() else {
        log::error(format_args!("hook: original jniRegisterNativeMethods missing"));
        return JNI_ERR;
    };
    register(
        env,
        class_name,
        select_batch(methods, new_methods.as_ref()),
        num_methods,
    )
}
