// native 方法注册拦截的核心算法
// 两条注册路径（JNIEnv->RegisterNatives 与 jniRegisterNativeMethods）共用此逻辑
use crate::log;
use jni_sys::JNINativeMethod;
use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use super::{CaptureTable, ZYGOTE_CLASS};

// 单批注册中最多替换的目标方法数
const MAX_REPLACED_PER_BATCH: usize = 3;

// 目标方法唯一的真实原函数指针，不同签名版本共用
pub(crate) struct OriginalMethod(AtomicPtr<c_void>);

impl OriginalMethod {
    pub(crate) const fn new() -> Self {
        Self(AtomicPtr::new(ptr::null_mut()))
    }

    pub(crate) fn store(&self, func: *mut c_void) {
        self.0.store(func, Ordering::Release);
    }

    pub(crate) fn raw(&self) -> *mut c_void {
        self.0.load(Ordering::Acquire)
    }

    // 调用方保证 F 与注册时的签名一致
    pub(crate) unsafe fn load_as<F: Copy>(&self) -> Option<F> {
        const { assert!(size_of::<F>() == size_of::<*mut c_void>()) };
        let raw = self.raw();
        if raw.is_null() {
            return None;
        }
        Some(std::mem::transmute_copy::<*mut c_void, F>(&raw))
    }
}

// 某个签名对应的替换函数
#[derive(Clone, Copy, Debug)]
pub(crate) struct Replacement {
    pub(crate) signature: &'static str,
    pub(crate) func: usize,
}

// 被拦截的目标方法：名称、原函数槽、各平台版本的签名与替换函数
pub(crate) struct TargetMethod {
    pub(crate) name: &'static str,
    pub(crate) orig: &'static OriginalMethod,
    pub(crate) replacements: Vec<Replacement>,
}

// 已被替换的原始方法描述，卸载时批量重新注册
pub(crate) struct ReplacedMethod {
    pub(crate) name: CString,
    pub(crate) signature: CString,
    pub(crate) func: usize,
}

pub(crate) fn copy_method(method: &JNINativeMethod) -> JNINativeMethod {
    JNINativeMethod {
        name: method.name,
        signature: method.signature,
        fnPtr: method.fnPtr,
    }
}

unsafe fn method_strings(method: &JNINativeMethod) -> Option<(String, String)> {
    if method.name.is_null() || method.signature.is_null() {
        return None;
    }
    let name = CStr::from_ptr(method.name).to_string_lossy().into_owned();
    let signature = CStr::from_ptr(method.signature)
        .to_string_lossy()
        .into_owned();
    Some((name, signature))
}

// 1. 每个方法先写入捕获表，保证替换前原像已保存
// 2. 仅 Zygote 类构建整批副本，按签名精确匹配替换目标方法
// 返回 None 表示应原样转发调用方的数组
pub(crate) unsafe fn hook_and_save_methods(
    capture: &mut CaptureTable,
    replaced: &mut Vec<ReplacedMethod>,
    targets: &[TargetMethod],
    class_name: &str,
    methods: &[JNINativeMethod],
) -> Option<Vec<JNINativeMethod>> {
    let mut new_methods: Option<Vec<JNINativeMethod>> =
        (class_name == ZYGOTE_CLASS).then(|| methods.iter().map(copy_method).collect());
    let mut matched = vec![false; targets.len()];
    let mut hooked = 0usize;

    for (index, method) in methods.iter().enumerate() {
        let Some((name, signature)) = method_strings(method) else {
            log::warn(format_args!(
                "hook: {class_name} method #{index} has null name or signature"
            ));
            continue;
        };
        if let Err(err) = capture.record(class_name, &name, &signature, method.fnPtr) {
            log::warn(format_args!(
                "hook: failed to capture {class_name}.{name}{signature}: {err:?}"
            ));
        }

        let Some(batch) = new_methods.as_mut() else {
            continue;
        };
        if hooked >= MAX_REPLACED_PER_BATCH {
            continue;
        }
        let Some(target_index) = targets.iter().position(|target| target.name == name) else {
            continue;
        };
        if matched[target_index] {
            continue;
        }

        let target = &targets[target_index];
        let Some(replacement) = target
            .replacements
            .iter()
            .find(|replacement| replacement.signature == signature)
        else {
            log::warn(format_args!(
                "hook: no replacement for {name} with signature {signature}"
            ));
            continue;
        };

        batch[index].fnPtr = replacement.func as *mut c_void;
        target.orig.store(method.fnPtr);
        replaced.push(ReplacedMethod {
            name: CString::from(CStr::from_ptr(method.name)),
            signature: CString::from(CStr::from_ptr(method.signature)),
            func: method.fnPtr as usize,
        });
        matched[target_index] = true;
        hooked += 1;
        log::info(format_args!("hook: replaced #{name}"));
    }
    new_methods
}

// 选择实际转发给原注册函数的数组：有副本用副本，否则原样转发
pub(crate) fn select_batch(
    incoming: *const JNINativeMethod,
    replaced: Option<&Vec<JNINativeMethod>>,
) -> *const JNINativeMethod {
    replaced.map_or(incoming, |batch| batch.as_ptr())
}

// 由替换日志构造重新注册用的原始方法数组，指针借用 replaced 中的字符串
pub(crate) fn restore_batch(replaced: &[ReplacedMethod]) -> Vec<JNINativeMethod> {
    replaced
        .iter()
        .map(|method| JNINativeMethod {
            name: method.name.as_ptr() as *mut c_char,
            signature: method.signature.as_ptr() as *mut c_char,
            fnPtr: method.func as *mut c_void,
        })
        .collect()
}
