// native 方法捕获与注册拦截
mod capture;
mod class_name;
mod register;

pub(crate) use capture::CaptureTable;
pub(crate) use class_name::ClassNameCache;
#[cfg(test)]
pub(crate) use class_name::to_internal_name;
pub(crate) use register::{
    OriginalMethod, ReplacedMethod, Replacement, TargetMethod, hook_and_save_methods,
    restore_batch, select_batch,
};

// 承载进程特化 native 方法的类
pub(crate) const ZYGOTE_CLASS: &str = "com/android/internal/os/Zygote";
