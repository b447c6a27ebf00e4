// xhook C 库绑定，作为 Android 上的符号替换原语
use std::ffi::{CStr, c_char, c_int, c_void};

use super::SymbolPatcher;

#[link(name = "xhook")]
unsafe extern "C" {
    fn xhook_register(
        pathname_regex_str: *const c_char,
        symbol: *const c_char,
        new_func: *mut c_void,
        old_func: *mut *mut c_void,
    ) -> c_int;
    fn xhook_refresh(async_: c_int) -> c_int;
    fn xhook_clear();
    fn xhook_enable_debug(flag: c_int);
    fn xhook_enable_sigsegv_protection(flag: c_int);
}

pub struct XhookPatcher;

impl XhookPatcher {
    // 调试模式下打开 xhook 日志并关闭其 SIGSEGV 保护，便于定位崩溃
    pub fn new(debug: bool) -> Self {
        if debug {
            unsafe {
                xhook_enable_debug(1);
                xhook_enable_sigsegv_protection(0);
            }
        }
        Self
    }
}

impl SymbolPatcher for XhookPatcher {
    unsafe fn register(
        &mut self,
        path_regex: &CStr,
        symbol: &CStr,
        new_func: *mut c_void,
        old_func: *mut *mut c_void,
    ) -> i32 {
        xhook_register(path_regex.as_ptr(), symbol.as_ptr(), new_func, old_func)
    }

    // 同步刷新，返回前所有 old_func 已回填
    fn refresh(&mut self) -> i32 {
        unsafe { xhook_refresh(0) }
    }

    fn clear(&mut self) {
        unsafe { xhook_clear() }
    }
}
