// 动态分发桥接：AndroidRuntime 虚表与 JNIEnv 函数表的一次性替换
// 替换表在 Rust 堆上组装，安装与恢复都是显式的 acquire/release 调用
mod jni_table;
mod vtable;

pub(crate) use jni_table::{JniTableOverride, RegisterNativesFn};
pub(crate) use vtable::{OnVmCreatedFn, SetArgv0Fn, VtableOverride};
#[cfg(test)]
pub(crate) use vtable::RuntimeVtable;

#[cfg(test)]
mod tests;
