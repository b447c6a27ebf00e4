use jni_sys::JNIEnv;
use std::ffi::{c_char, c_int, c_void};
use std::ptr;

pub(crate) type OnVmCreatedFn = unsafe extern "C" fn(this: *mut c_void, env: *mut JNIEnv);
// android::AndroidRuntime::setArgv0(const char *, bool)
pub(crate) type SetArgv0Fn =
    unsafe extern "C" fn(this: *mut c_void, argv0: *const c_char, set_proc_name: bool);

// android::AndroidRuntime 虚表布局，只读写 onVmCreated 槽
#[repr(C)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub(crate) struct RuntimeVtable {
    pub(crate) rtti: *const c_void,
    pub(crate) dtor: *const c_void,
    pub(crate) on_vm_created: Option<OnVmCreatedFn>,
    pub(crate) on_started: Option<unsafe extern "C" fn(this: *mut c_void)>,
    pub(crate) on_zygote_init: Option<unsafe extern "C" fn(this: *mut c_void)>,
    pub(crate) on_exit: Option<unsafe extern "C" fn(this: *mut c_void, code: c_int)>,
}

// 对象的 vptr 被临时指向一份只改了 onVmCreated 槽的副本
// 对象类型本身不变，release 时恢复原 vptr 并释放副本
pub(crate) struct VtableOverride {
    object: *mut c_void,
    original: *const RuntimeVtable,
    replacement: Box<RuntimeVtable>,
}

// AppRuntime 是进程级单例，仅在 zygote 主线程访问
unsafe impl Send for VtableOverride {}

impl VtableOverride {
    // 返回替换守卫与原 onVmCreated 处理函数
    pub(crate) unsafe fn acquire(
        object: *mut c_void,
        on_vm_created: OnVmCreatedFn,
    ) -> Option<(Self, Option<OnVmCreatedFn>)> {
        if object.is_null() {
            return None;
        }
        let vptr = object as *mut *const RuntimeVtable;
        let original = *vptr;
        if original.is_null() {
            return None;
        }

        let mut replacement = Box::new(ptr::read(original));
        let previous = replacement.on_vm_created;
        replacement.on_vm_created = Some(on_vm_created);
        *vptr = &*replacement as *const RuntimeVtable;
        Some((
            Self {
                object,
                original,
                replacement,
            },
            previous,
        ))
    }

    #[cfg(test)]
    pub(crate) fn original(&self) -> *const RuntimeVtable {
        self.original
    }

    pub(crate) fn is_active(&self) -> bool {
        let current = unsafe { *(self.object as *const *const RuntimeVtable) };
        ptr::eq(current, &*self.replacement)
    }

    pub(crate) fn release(self) {
        drop(self);
    }
}

impl Drop for VtableOverride {
    fn drop(&mut self) {
        if self.is_active() {
            unsafe { *(self.object as *mut *const RuntimeVtable) = self.original };
        }
    }
}
