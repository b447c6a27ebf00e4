// 隐藏协调客户端：询问特权守护进程某个应用进程是否需要隐藏注入痕迹
// 守护进程的任何失败都降级为“不隐藏”
use crate::errno::Errno;
use crate::log;

mod socket;

pub use socket::SocketDaemon;

// 守护进程 RPC
pub trait HideDaemon: Send + Sync {
    fn check_hide(&self, uid: i32, process_name: &str) -> Result<bool, Errno>;
    fn request_hide(&self) -> Result<(), Errno>;
}

pub(crate) struct HideClient {
    daemon: Box<dyn HideDaemon>,
}

impl HideClient {
    pub(crate) fn new(daemon: Box<dyn HideDaemon>) -> Self {
        Self { daemon }
    }

    pub(crate) fn should_hide(&self, uid: i32, process_name: &str) -> bool {
        match self.daemon.check_hide(uid, process_name) {
            Ok(hide) => hide,
            Err(err) => {
                log::warn(format_args!(
                    "hide: check_hide({uid}, {process_name}) failed: {err:?}"
                ));
                false
            }
        }
    }

    // 切换 SELinux 上下文前调用，之后守护进程 socket 不再可达
    pub(crate) fn notify_self_hide(&self) {
        match self.daemon.request_hide() {
            Ok(()) => log::debug(format_args!("hook: process successfully hidden")),
            Err(err) => log::warn(format_args!("hide: request_hide failed: {err:?}")),
        }
    }
}
