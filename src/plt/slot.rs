use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

// 原函数地址槽，由替换原语回填，替换函数通过 get() 取回带类型的函数指针
// F 必须是与指针等宽的函数指针类型
pub struct OrigSlot<F> {
    ptr: AtomicPtr<c_void>,
    _marker: PhantomData<F>,
}

impl<F: Copy> OrigSlot<F> {
    pub const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> Option<F> {
        const { assert!(size_of::<F>() == size_of::<*mut c_void>()) };
        let raw = self.ptr.load(Ordering::Acquire);
        if raw.is_null() {
            return None;
        }
        Some(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&raw) })
    }

    pub fn raw(&self) -> *mut c_void {
        self.ptr.load(Ordering::Acquire)
    }

    pub fn set_raw(&self, raw: *mut c_void) {
        self.ptr.store(raw, Ordering::Release);
    }

    pub fn is_resolved(&self) -> bool {
        !self.raw().is_null()
    }

    pub(crate) fn cell(&self) -> &AtomicPtr<c_void> {
        &self.ptr
    }
}

impl<F: Copy> Default for OrigSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}
