// JNIEnv->RegisterNatives 路径下解析 jclass 的全限定名
// 缓存 java/lang/Class 的全局引用与 getName 方法 ID，显式初始化、显式释放
use crate::jni_env::JniEnv;
use crate::log;
use jni_sys::{jclass, jmethodID, jobject, jstring};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct ClassNameCache {
    class_ref: usize,
    get_name: usize,
}

impl ClassNameCache {
    pub(crate) const fn new() -> Self {
        Self {
            class_ref: 0,
            get_name: 0,
        }
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.class_ref != 0
    }

    pub(crate) fn resolve(&mut self, env: &JniEnv, class: jclass) -> Option<String> {
        if class.is_null() {
            return None;
        }
        if !self.is_initialized() {
            self.init(env)?;
        }
        let name_ref = env.call_object_method(class, self.get_name as jmethodID)?;
        let name = env.string_utf(name_ref as jstring);
        env.delete_local_ref(name_ref);
        name.map(|name| to_internal_name(&name))
    }

    // 删除全局引用并清空缓存，之后可再次按需初始化
    pub(crate) fn release(&mut self, env: &JniEnv) {
        if self.class_ref != 0 {
            env.delete_global_ref(self.class_ref as jobject);
        }
        *self = Self::new();
    }

    fn init(&mut self, env: &JniEnv) -> Option<()> {
        let local = env.find_class("java/lang/Class")?;
        let global = env.new_global_ref(local);
        env.delete_local_ref(local);
        let Some(global) = global else {
            log::error(format_args!("hook: NewGlobalRef(java/lang/Class) failed"));
            return None;
        };
        let Some(get_name) = env.get_method_id(global, "getName", "()Ljava/lang/String;") else {
            log::error(format_args!("hook: Class.getName not found"));
            env.delete_global_ref(global);
            return None;
        };
        self.class_ref = global as usize;
        self.get_name = get_name as usize;
        Some(())
    }
}

// Class.getName 返回点分形式，转换为 jniRegisterNativeMethods 使用的斜杠形式
pub(crate) fn to_internal_name(binary_name: &str) -> String {
    binary_name.replace('.', "/")
}
