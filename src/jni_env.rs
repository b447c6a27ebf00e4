// JNIEnv / JavaVM 的薄封装，所有调用都容忍函数表缺项并以 Option 返回
use jni_sys::{JNI_OK, JNIEnv, JNINativeInterface_, JavaVM, jclass, jint, jmethodID, jobject, jstring};
use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;

#[derive(Clone, Copy)]
pub(crate) struct JniEnv {
    env: *mut JNIEnv,
}

impl JniEnv {
    pub(crate) unsafe fn from_raw(env: *mut JNIEnv) -> Option<Self> {
        if env.is_null() || (*env).is_null() {
            return None;
        }
        Some(Self { env })
    }

    pub(crate) fn raw(&self) -> *mut JNIEnv {
        self.env
    }

    // 当前生效的函数表指针
    pub(crate) fn functions(&self) -> *const JNINativeInterface_ {
        unsafe { *self.env }
    }

    pub(crate) unsafe fn set_functions(&self, table: *const JNINativeInterface_) {
        *self.env = table;
    }

    fn table(&self) -> &JNINativeInterface_ {
        unsafe { &**self.env }
    }

    pub(crate) fn find_class(&self, name: &str) -> Option<jclass> {
        let find_class = self.table().FindClass?;
        let name = CString::new(name).ok()?;
        let class = unsafe { find_class(self.env, name.as_ptr()) };
        if class.is_null() {
            self.clear_pending_exception();
            return None;
        }
        Some(class)
    }

    pub(crate) fn new_global_ref(&self, obj: jobject) -> Option<jobject> {
        let new_global_ref = self.table().NewGlobalRef?;
        let global = unsafe { new_global_ref(self.env, obj) };
        (!global.is_null()).then_some(global)
    }

    pub(crate) fn delete_local_ref(&self, obj: jobject) {
        if obj.is_null() {
            return;
        }
        if let Some(delete_local_ref) = self.table().DeleteLocalRef {
            unsafe { delete_local_ref(self.env, obj) };
        }
    }

    pub(crate) fn delete_global_ref(&self, obj: jobject) {
        if obj.is_null() {
            return;
        }
        if let Some(delete_global_ref) = self.table().DeleteGlobalRef {
            unsafe { delete_global_ref(self.env, obj) };
        }
    }

    pub(crate) fn get_method_id(&self, class: jclass, name: &str, sig: &str) -> Option<jmethodID> {
        let get_method_id = self.table().GetMethodID?;
        let name = CString::new(name).ok()?;
        let sig = CString::new(sig).ok()?;
        let method = unsafe { get_method_id(self.env, class, name.as_ptr(), sig.as_ptr()) };
        if method.is_null() {
            self.clear_pending_exception();
            return None;
        }
        Some(method)
    }

    // 无参调用返回对象的实例方法
    pub(crate) fn call_object_method(&self, obj: jobject, method: jmethodID) -> Option<jobject> {
        let call = self.table().CallObjectMethodA?;
        let result = unsafe { call(self.env, obj, method, ptr::null()) };
        if self.clear_pending_exception() || result.is_null() {
            return None;
        }
        Some(result)
    }

    // 读取 Java 字符串的 modified UTF-8 内容，读取后立即释放
    pub(crate) fn string_utf(&self, value: jstring) -> Option<String> {
        if value.is_null() {
            return None;
        }
        let get_chars = self.table().GetStringUTFChars?;
        let release_chars = self.table().ReleaseStringUTFChars?;
        let chars: *const c_char = unsafe { get_chars(self.env, value, ptr::null_mut()) };
        if chars.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(chars) }
            .to_string_lossy()
            .into_owned();
        unsafe { release_chars(self.env, value, chars) };
        Some(text)
    }

    pub(crate) fn java_vm(&self) -> Option<*mut JavaVM> {
        let get_java_vm = self.table().GetJavaVM?;
        let mut vm: *mut JavaVM = ptr::null_mut();
        let ret = unsafe { get_java_vm(self.env, &mut vm) };
        (ret == JNI_OK && !vm.is_null()).then_some(vm)
    }

    // 直接经由 env 函数表注册 native 方法
    #[cfg(test)]
    pub(crate) fn register_natives(
        &self,
        class: jclass,
        methods: *const jni_sys::JNINativeMethod,
        count: jint,
    ) -> Option<jint> {
        let register = self.table().RegisterNatives?;
        Some(unsafe { register(self.env, class, methods, count) })
    }

    fn clear_pending_exception(&self) -> bool {
        let table = self.table();
        let (Some(check), Some(clear)) = (table.ExceptionCheck, table.ExceptionClear) else {
            return false;
        };
        unsafe {
            if check(self.env) != 0 {
                clear(self.env);
                return true;
            }
        }
        false
    }
}

// 通过保存的 JavaVM 取得当前线程的 JNIEnv
pub(crate) unsafe fn env_from_vm(vm: *mut JavaVM, version: jint) -> Option<JniEnv> {
    if vm.is_null() || (*vm).is_null() {
        return None;
    }
    let get_env = (**vm).GetEnv?;
    let mut env: *mut c_void = ptr::null_mut();
    if get_env(vm, &mut env, version) != JNI_OK {
        return None;
    }
    JniEnv::from_raw(env as *mut JNIEnv)
}
