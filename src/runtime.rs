// runtime 模块入口：全局状态、安装与卸载流程，以及各符号 hook 的入口函数
use crate::config::Config;
use crate::errno::Errno;
use crate::hide::HideDaemon;
use crate::plt::SymbolPatcher;

mod bridge_entry;
mod install;
mod jni_entry;
mod process_hooks;
mod specialize_host;
mod state;
mod teardown;

pub(crate) use specialize_host::RuntimeHost;
pub(crate) use state::MutexPoisonRecover;
pub use state::{HookStats, SelfUnloadFn};

pub(crate) fn hook_functions(
    config: Config,
    patcher: Box<dyn SymbolPatcher>,
    daemon: Box<dyn HideDaemon>,
    unloader: Option<SelfUnloadFn>,
) -> Errno {
    install::hook_functions(config, patcher, daemon, unloader)
}

pub(crate) fn unhook_functions() -> Errno {
    teardown::unhook_functions()
}

pub(crate) fn stats() -> HookStats {
    state::stats()
}

pub(crate) fn captured_native(class: &str, name: &str, signature: &str) -> Option<usize> {
    state::captured_native(class, name, signature)
}

#[cfg(test)]
mod tests;
