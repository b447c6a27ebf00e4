// 进程特化状态机：拦截 Zygote 的三个特化入口，在真实 fork 前后插入 pre/post 阶段
mod context;
mod current;
mod flow;
mod jni_hooks;

pub(crate) use context::{
    AppSpecializeArgs, ForkPhase, HookContext, ServerForkArgs, SpecializeArgs,
};
#[cfg(test)]
pub(crate) use context::MOUNT_EXTERNAL_NONE;
pub(crate) use current::{Published, current, publish};
pub(crate) use flow::{SpecializeHost, run_app, run_server_fork};
pub(crate) use jni_hooks::zygote_targets;
#[cfg(test)]
pub(crate) use jni_hooks::{
    ForkAndSpecializeM, ForkAndSpecializeO, ForkAndSpecializeP, ForkAndSpecializeQAlt,
    ForkAndSpecializeR, ForkAndSpecializeSamsungM, ForkAndSpecializeSamsungN,
    ForkAndSpecializeSamsungO, ForkAndSpecializeSamsungP, ForkSystemServer,
    ForkSystemServerSamsungQ, SpecializeAppProcessQ, SpecializeAppProcessQAlt,
    SpecializeAppProcessR, SpecializeAppProcessSamsungQ,
};
