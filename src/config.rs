// 注入引擎配置：调试开关、守护进程 socket 以及 hook 目标路径规则
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DEBUG: &str = "ZYGOTE_HOOK_DEBUG";
pub const ENV_DAEMON_SOCKET: &str = "ZYGOTE_HOOK_DAEMON_SOCKET";

const DEFAULT_DAEMON_SOCKET: &str = "/dev/socket/zygote_hook_daemon";
// libandroid_runtime 内的 fork / selinux / jniRegisterNativeMethods 调用点
const DEFAULT_RUNTIME_LIBRARY: &str = ".*/libandroid_runtime.so$";
// AndroidRuntime::setArgv0 的调用点在 app_process 可执行文件中
const DEFAULT_APP_PROCESS: &str = "^/system/bin/app_process.*";
const DEFAULT_DAEMON_TIMEOUT_MS: u64 = 500;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub debug: bool,
    pub daemon_socket: PathBuf,
    pub daemon_timeout: Duration,
    pub runtime_library: String,
    pub app_process: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            daemon_socket: PathBuf::from(DEFAULT_DAEMON_SOCKET),
            daemon_timeout: Duration::from_millis(DEFAULT_DAEMON_TIMEOUT_MS),
            runtime_library: DEFAULT_RUNTIME_LIBRARY.to_string(),
            app_process: DEFAULT_APP_PROCESS.to_string(),
        }
    }
}

impl Config {
    // 从环境变量覆盖默认值，无法解析的取值保留默认
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(debug) = lookup(ENV_DEBUG).as_deref().and_then(parse_flag) {
            config.debug = debug;
        }
        if let Some(socket) = lookup(ENV_DAEMON_SOCKET) {
            let socket = socket.trim();
            if !socket.is_empty() {
                config.daemon_socket = PathBuf::from(socket);
            }
        }
        config
    }
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
