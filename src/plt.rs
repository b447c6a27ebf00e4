// 符号 hook 登记层：在外部 PLT 替换原语之上记录每条 hook，保证可逆
use std::ffi::{CStr, c_void};

mod registry;
mod slot;
#[cfg(target_os = "android")]
mod xhook;

pub use registry::HookRegistry;
pub use slot::OrigSlot;
#[cfg(target_os = "android")]
pub use xhook::XhookPatcher;

// 外部符号替换原语，语义与 xhook 一致
// register 只登记，refresh 才真正写入 GOT 并回填 old_func
pub trait SymbolPatcher: Send {
    // old_func 非空时，refresh 成功后底层把原函数地址写入 *old_func
    // 以原函数地址作为 new_func 且 old_func 为空即为恢复
    unsafe fn register(
        &mut self,
        path_regex: &CStr,
        symbol: &CStr,
        new_func: *mut c_void,
        old_func: *mut *mut c_void,
    ) -> i32;

    fn refresh(&mut self) -> i32;

    // 清空已生效的登记项
    fn clear(&mut self);

    fn lookup(&self, symbol: &CStr) -> *mut c_void {
        unsafe { libc::dlsym(libc::RTLD_DEFAULT, symbol.as_ptr()) }
    }
}
