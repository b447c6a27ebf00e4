// 运行时核心状态：符号 hook 登记表、native 方法捕获表、桥接替换表、隐藏客户端
// 全部状态由一把进程级互斥锁保护，转发到宿主、fork、询问守护进程时都不持锁
use crate::bridge::{JniTableOverride, VtableOverride};
use crate::hide::HideClient;
use crate::natives::{CaptureTable, ClassNameCache, ReplacedMethod};
use crate::plt::HookRegistry;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard};

// 加载器提供的自卸载回调
pub type SelfUnloadFn = unsafe extern "C" fn();

// Mutex poison 恢复扩展，避免持锁线程 panic 后引发连锁 panic
pub(crate) trait MutexPoisonRecover<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexPoisonRecover<T> for Mutex<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub(super) struct CoreState {
    pub(super) installed: bool,
    pub(super) registry: Option<HookRegistry>,
    pub(super) capture: Option<CaptureTable>,
    pub(super) replaced: Vec<ReplacedMethod>,
    // JavaVM*，卸载时用于重新获取 JNIEnv
    pub(super) java_vm: usize,
    pub(super) vtable: Option<VtableOverride>,
    pub(super) jni_table: Option<JniTableOverride>,
    pub(super) class_name: ClassNameCache,
    pub(super) hide: Option<Arc<HideClient>>,
    pub(super) unloader: Option<SelfUnloadFn>,
}

impl CoreState {
    pub(super) fn new() -> Self {
        Self {
            installed: false,
            registry: None,
            capture: None,
            replaced: Vec::new(),
            java_vm: 0,
            vtable: None,
            jni_table: None,
            class_name: ClassNameCache::new(),
            hide: None,
            unloader: None,
        }
    }
}

pub(super) struct GlobalState {
    pub(super) core: Mutex<CoreState>,
}

pub(super) static GLOBAL: Lazy<GlobalState> = Lazy::new(|| GlobalState {
    core: Mutex::new(CoreState::new()),
});

// 诊断快照
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HookStats {
    pub installed: bool,
    pub symbol_hooks: usize,
    pub captured_methods: usize,
    pub captured_classes: usize,
    pub replaced_methods: usize,
    pub env_table_active: bool,
}

pub(super) fn stats() -> HookStats {
    let core = GLOBAL.core.lock_or_poison();
    HookStats {
        installed: core.installed,
        symbol_hooks: core.registry.as_ref().map_or(0, |registry| registry.len()),
        captured_methods: core.capture.as_ref().map_or(0, |capture| capture.len()),
        captured_classes: core
            .capture
            .as_ref()
            .map_or(0, |capture| capture.classes().len()),
        replaced_methods: core.replaced.len(),
        env_table_active: core.jni_table.is_some(),
    }
}

pub(super) fn captured_native(class: &str, name: &str, signature: &str) -> Option<usize> {
    let core = GLOBAL.core.lock_or_poison();
    let func = core.capture.as_ref()?.lookup(class, name, signature)?;
    Some(func as usize)
}
