#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

#[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
compile_error!("zygote_hook supports only 64-bit architectures: aarch64 and x86_64");

// 公共 API 层，提供安装、卸载与诊断查询
mod api;
// mmap 字符串区，捕获表整块释放
mod arena;
// AndroidRuntime 虚表与 JNIEnv 函数表的临时替换
mod bridge;
// 环境变量配置
mod config;
// 错误码定义
mod errno;
// 隐藏协调客户端
mod hide;
// JNIEnv / JavaVM 薄封装
mod jni_env;
// 日志输出，Android 上使用 logcat
mod log;
// native 方法捕获与注册拦截
mod natives;
// 符号 hook 登记层
mod plt;
// 运行时状态、安装与卸载
mod runtime;
// 进程特化状态机
mod specialize;
// 版本信息
mod version;

pub use api::{
    HookStats, SelfUnloadFn, captured_native, get_version, hook_functions_with, is_installed,
    stats, unhook_functions,
};
#[cfg(target_os = "android")]
pub use api::hook_functions;
pub use config::{Config, ENV_DAEMON_SOCKET, ENV_DEBUG};
pub use errno::Errno;
pub use hide::{HideDaemon, SocketDaemon};
pub use log::{debug_enabled, set_debug_enabled};
#[cfg(target_os = "android")]
pub use plt::XhookPatcher;
pub use plt::{HookRegistry, OrigSlot, SymbolPatcher};
pub use version::{version, version_str, version_str_full};
