use super::Published;
use jni_sys::{jboolean, jint, jintArray, jlong, jobjectArray, jstring};
use libc::pid_t;
use std::ptr;

// Zygote.MOUNT_EXTERNAL_NONE
pub(crate) const MOUNT_EXTERNAL_NONE: jint = 0;

// 应用特化参数，Option 字段仅在较新平台的签名中存在
// 隐藏判定只读 uid、mount_external 与 nice_name
#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub(crate) struct AppSpecializeArgs {
    pub(crate) uid: jint,
    pub(crate) gid: jint,
    pub(crate) gids: jintArray,
    pub(crate) runtime_flags: jint,
    pub(crate) rlimits: jobjectArray,
    pub(crate) mount_external: jint,
    pub(crate) se_info: jstring,
    pub(crate) nice_name: jstring,
    pub(crate) instruction_set: jstring,
    pub(crate) app_data_dir: jstring,

    pub(crate) is_child_zygote: Option<jboolean>,
    pub(crate) is_top_app: Option<jboolean>,
    pub(crate) pkg_data_info_list: Option<jobjectArray>,
    pub(crate) whitelisted_data_info_list: Option<jobjectArray>,
    pub(crate) mount_data_dirs: Option<jboolean>,
    pub(crate) mount_storage_dirs: Option<jboolean>,
}

impl Default for AppSpecializeArgs {
    fn default() -> Self {
        Self {
            uid: 0,
            gid: 0,
            gids: ptr::null_mut(),
            runtime_flags: 0,
            rlimits: ptr::null_mut(),
            mount_external: MOUNT_EXTERNAL_NONE,
            se_info: ptr::null_mut(),
            nice_name: ptr::null_mut(),
            instruction_set: ptr::null_mut(),
            app_data_dir: ptr::null_mut(),
            is_child_zygote: None,
            is_top_app: None,
            pkg_data_info_list: None,
            whitelisted_data_info_list: None,
            mount_data_dirs: None,
            mount_storage_dirs: None,
        }
    }
}

impl AppSpecializeArgs {
    // MOUNT_EXTERNAL_NONE 时不询问守护进程，直接视为不隐藏
    pub(crate) fn hide_eligible(&self) -> bool {
        self.mount_external != MOUNT_EXTERNAL_NONE
    }
}

#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub(crate) struct ServerForkArgs {
    pub(crate) uid: jint,
    pub(crate) gid: jint,
    pub(crate) gids: jintArray,
    pub(crate) runtime_flags: jint,
    pub(crate) rlimits: jobjectArray,
    pub(crate) permitted_capabilities: jlong,
    pub(crate) effective_capabilities: jlong,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum SpecializeArgs {
    App(AppSpecializeArgs),
    Server(ServerForkArgs),
}

impl SpecializeArgs {
    pub(crate) fn uid(&self) -> jint {
        match self {
            Self::App(args) => args.uid,
            Self::Server(args) => args.uid,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ForkPhase {
    Idle,
    PreFork,
    ParentDone,
    ChildContinuing,
    PostFork,
}

// 当前正在进行的特化调用，仅在该调用的动态范围内存在
#[derive(Debug)]
pub(crate) struct HookContext {
    pub(crate) pid: pid_t,
    pub(crate) do_hide: bool,
    pub(crate) phase: ForkPhase,
    pub(crate) args: SpecializeArgs,
}

impl HookContext {
    pub(crate) fn new(args: SpecializeArgs) -> Self {
        Self {
            pid: 0,
            do_hide: false,
            phase: ForkPhase::Idle,
            args,
        }
    }

    pub(crate) fn published(&self) -> Published {
        Published {
            pid: self.pid,
            do_hide: self.do_hide,
        }
    }

    pub(crate) fn is_parent(&self) -> bool {
        self.pid != 0
    }
}
