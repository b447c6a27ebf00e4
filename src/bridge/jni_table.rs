use crate::jni_env::JniEnv;
use jni_sys::{JNIEnv, JNINativeInterface_, JNINativeMethod, jclass, jint};
use std::ptr;

pub(crate) type RegisterNativesFn = unsafe extern "system" fn(
    env: *mut JNIEnv,
    clazz: jclass,
    methods: *const JNINativeMethod,
    num_methods: jint,
) -> jint;

// JNIEnv 函数表副本，仅 RegisterNatives 槽被替换
pub(crate) struct JniTableOverride {
    original: *const JNINativeInterface_,
    replacement: Box<JNINativeInterface_>,
}

unsafe impl Send for JniTableOverride {}

impl JniTableOverride {
    pub(crate) unsafe fn install(env: &JniEnv, register_natives: RegisterNativesFn) -> Option<Self> {
        let original = env.functions();
        if original.is_null() {
            return None;
        }
        let mut replacement = Box::new(ptr::read(original));
        replacement.RegisterNatives = Some(register_natives);
        env.set_functions(&*replacement);
        Some(Self {
            original,
            replacement,
        })
    }

    #[cfg(test)]
    pub(crate) fn original(&self) -> *const JNINativeInterface_ {
        self.original
    }

    pub(crate) fn original_register_natives(&self) -> Option<RegisterNativesFn> {
        unsafe { (*self.original).RegisterNatives }
    }

    pub(crate) fn is_active_on(&self, env: &JniEnv) -> bool {
        ptr::eq(env.functions(), &*self.replacement)
    }

    // 恢复原函数表；若 env 已不再指向副本则不改动 env
    // 副本只被安装在一个 env 上，恢复后可直接释放
    pub(crate) unsafe fn restore(self, env: &JniEnv) {
        if self.is_active_on(env) {
            env.set_functions(self.original);
        }
    }
}
