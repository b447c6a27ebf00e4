// 公共 API 层：安装、卸载注入 hook 与诊断查询
use crate::config::Config;
use crate::errno::Errno;
use crate::hide::HideDaemon;
use crate::plt::SymbolPatcher;
use crate::runtime;
use crate::version;

pub use crate::runtime::{HookStats, SelfUnloadFn};

// 使用自定义的符号替换原语与守护进程客户端安装，只能成功安装一次
pub fn hook_functions_with(
    config: Config,
    patcher: Box<dyn SymbolPatcher>,
    daemon: Box<dyn HideDaemon>,
    unloader: Option<SelfUnloadFn>,
) -> Errno {
    runtime::hook_functions(config, patcher, daemon, unloader)
}

// 以 xhook 与 Unix socket 守护进程客户端安装
#[cfg(target_os = "android")]
pub fn hook_functions(config: Config, unloader: Option<SelfUnloadFn>) -> Errno {
    let patcher = crate::plt::XhookPatcher::new(config.debug);
    let daemon = crate::hide::SocketDaemon::from_config(&config);
    runtime::hook_functions(config, Box::new(patcher), Box::new(daemon), unloader)
}

// 恢复原始 native 方法与符号绑定，未安装时返回 Errno::Uninit
pub fn unhook_functions() -> Errno {
    runtime::unhook_functions()
}

pub fn stats() -> HookStats {
    runtime::stats()
}

// 查询某个 native 方法注册时的原函数地址，类名使用内部形式（a/b/C）
pub fn captured_native(class: &str, name: &str, signature: &str) -> Option<usize> {
    runtime::captured_native(class, name, signature)
}

pub fn is_installed() -> bool {
    runtime::stats().installed
}

pub fn get_version() -> String {
    version::version_str_full()
}
