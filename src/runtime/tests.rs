// 安装与卸载流程的单元测试：内存中的符号表 + 最小化的 JNIEnv/JavaVM
use super::jni_entry::{
    OLD_ENV_REGISTER_NATIVES,
    new_env_register_natives,
    new_jni_register_native_methods,
};
use super::process_hooks::{ForkFn, OLD_FORK};
use super::state::{CoreState, GLOBAL};
use super::{MutexPoisonRecover, captured_native, hook_functions, stats, unhook_functions};
use crate::bridge::RegisterNativesFn;
use crate::config::Config;
use crate::errno::Errno;
use crate::hide::{HideClient, HideDaemon};
use crate::natives::OriginalMethod;
use crate::plt::SymbolPatcher;
use crate::specialize::{
    self,
    ForkAndSpecializeM,
    ForkAndSpecializeO,
    ForkAndSpecializeP,
    ForkAndSpecializeQAlt,
    ForkAndSpecializeR,
    ForkAndSpecializeSamsungM,
    ForkAndSpecializeSamsungN,
    ForkAndSpecializeSamsungO,
    ForkAndSpecializeSamsungP,
    ForkSystemServer,
    ForkSystemServerSamsungQ,
    SpecializeAppProcessQ,
    SpecializeAppProcessQAlt,
    SpecializeAppProcessR,
    SpecializeAppProcessSamsungQ,
    zygote_targets,
};
use jni_sys::{
    JNI_FALSE,
    JNI_OK,
    JNI_TRUE,
    JNIEnv,
    JNIInvokeInterface_,
    JNINativeInterface_,
    JNINativeMethod,
    JavaVM,
    jboolean,
    jclass,
    jint,
    jintArray,
    jlong,
    jmethodID,
    jobject,
    jobjectArray,
    jstring,
    jvalue,
};
use libc::pid_t;
use std::collections::BTreeMap;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const ZYGOTE: &CStr = c"com/android/internal/os/Zygote";
const FORK_SIG: &str = "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;)I";
const SPECIALIZE_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;ZLjava/lang/String;Ljava/lang/String;)V";
const SERVER_SIG: &str = "(II[II[[IJJ)I";

// 全局状态在测试间共享，逐个串行执行
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock_or_poison();
    *GLOBAL.core.lock_or_poison() = CoreState::new();
    guard
}

#[derive(Default)]
struct SymbolTable {
    bindings: BTreeMap<String, usize>,
    pending: Vec<(String, usize, usize)>,
    exported: BTreeMap<String, usize>,
}

struct TablePatcher(Arc<Mutex<SymbolTable>>);

impl SymbolPatcher for TablePatcher {
    unsafe fn register(
        &mut self,
        _path_regex: &CStr,
        symbol: &CStr,
        new_func: *mut c_void,
        old_func: *mut *mut c_void,
    ) -> i32 {
        let symbol = symbol.to_string_lossy().into_owned();
        self.0
            .lock()
            .unwrap()
            .pending
            .push((symbol, new_func as usize, old_func as usize));
        0
    }

    fn refresh(&mut self) -> i32 {
        let mut table = self.0.lock().unwrap();
        let pending = table.pending.clone();
        for (symbol, new_func, old_func) in pending {
            let Some(current) = table.bindings.get(&symbol).copied() else {
                continue;
            };
            if old_func != 0 {
                unsafe { *(old_func as *mut *mut c_void) = current as *mut c_void };
            }
            table.bindings.insert(symbol, new_func);
        }
        0
    }

    fn clear(&mut self) {
        self.0.lock().unwrap().pending.clear();
    }

    fn lookup(&self, symbol: &CStr) -> *mut c_void {
        let table = self.0.lock().unwrap();
        table
            .exported
            .get(symbol.to_str().unwrap_or_default())
            .map_or(ptr::null_mut(), |addr| *addr as *mut c_void)
    }
}

struct NeverHide;

impl HideDaemon for NeverHide {
    fn check_hide(&self, _uid: i32, _process_name: &str) -> Result<bool, Errno> {
        Ok(false)
    }

    fn request_hide(&self) -> Result<(), Errno> {
        Ok(())
    }
}

// 原 jniRegisterNativeMethods：记录收到的类名、数组地址与函数指针
#[derive(Clone, Debug)]
struct RegisterCall {
    class_name: String,
    batch: usize,
    funcs: Vec<usize>,
}

static REGISTER_CALLS: Mutex<Vec<RegisterCall>> = Mutex::new(Vec::new());
static REGISTER_RESULT: AtomicI32 = AtomicI32::new(0);

unsafe extern "C" fn fake_jni_register_native_methods(
    _env: *mut JNIEnv,
    class_name: *const c_char,
    methods: *const JNINativeMethod,
    num_methods: c_int,
) -> c_int {
    let funcs = (0..num_methods as usize)
        .map(|i| (*methods.add(i)).fnPtr as usize)
        .collect();
    REGISTER_CALLS.lock_or_poison().push(RegisterCall {
        class_name: CStr::from_ptr(class_name).to_string_lossy().into_owned(),
        batch: methods as usize,
        funcs,
    });
    REGISTER_RESULT.load(Ordering::SeqCst)
}

fn take_register_calls() -> Vec<RegisterCall> {
    std::mem::take(&mut *REGISTER_CALLS.lock_or_poison())
}

static FAKE_VM: AtomicPtr<JavaVM> = AtomicPtr::new(ptr::null_mut());
static FAKE_ENV: AtomicPtr<JNIEnv> = AtomicPtr::new(ptr::null_mut());

unsafe extern "system" fn fake_get_java_vm(_env: *mut JNIEnv, vm: *mut *mut JavaVM) -> jint {
    *vm = FAKE_VM.load(Ordering::SeqCst);
    JNI_OK
}

unsafe extern "system" fn fake_get_env(
    _vm: *mut JavaVM,
    penv: *mut *mut c_void,
    _version: jint,
) -> jint {
    *penv = FAKE_ENV.load(Ordering::SeqCst) as *mut c_void;
    JNI_OK
}

// jclass 与 jstring 都直接指向 C 字符串，类对象本身就是 Class.getName 的结果
unsafe extern "system" fn fake_find_class(_env: *mut JNIEnv, name: *const c_char) -> jclass {
    name as jclass
}

unsafe extern "system" fn fake_new_global_ref(_env: *mut JNIEnv, obj: jobject) -> jobject {
    obj
}

unsafe extern "system" fn fake_delete_ref(_env: *mut JNIEnv, _obj: jobject) {}

unsafe extern "system" fn fake_get_method_id(
    _env: *mut JNIEnv,
    _clazz: jclass,
    _name: *const c_char,
    _sig: *const c_char,
) -> jmethodID {
    1usize as jmethodID
}

unsafe extern "system" fn fake_call_object_method_a(
    _env: *mut JNIEnv,
    obj: jobject,
    _method: jmethodID,
    _args: *const jvalue,
) -> jobject {
    obj
}

unsafe extern "system" fn fake_get_string_utf_chars(
    _env: *mut JNIEnv,
    value: jstring,
    _is_copy: *mut jboolean,
) -> *const c_char {
    value as *const c_char
}

unsafe extern "system" fn fake_release_string_utf_chars(
    _env: *mut JNIEnv,
    _value: jstring,
    _chars: *const c_char,
) {
}

// 进程内只创建一次，泄漏以保持指针稳定
fn fake_env() -> *mut JNIEnv {
    let existing = FAKE_ENV.load(Ordering::SeqCst);
    if !existing.is_null() {
        return existing;
    }
    let mut table: JNINativeInterface_ = unsafe { std::mem::zeroed() };
    table.GetJavaVM = Some(fake_get_java_vm);
    table.FindClass = Some(fake_find_class);
    table.NewGlobalRef = Some(fake_new_global_ref);
    table.DeleteGlobalRef = Some(fake_delete_ref);
    table.DeleteLocalRef = Some(fake_delete_ref);
    table.GetMethodID = Some(fake_get_method_id);
    table.CallObjectMethodA = Some(fake_call_object_method_a);
    table.GetStringUTFChars = Some(fake_get_string_utf_chars);
    table.ReleaseStringUTFChars = Some(fake_release_string_utf_chars);
    let table: &'static JNINativeInterface_ = Box::leak(Box::new(table));
    let env: *mut JNIEnv = Box::leak(Box::new(table as *const JNINativeInterface_));

    let mut invoke: JNIInvokeInterface_ = unsafe { std::mem::zeroed() };
    invoke.GetEnv = Some(fake_get_env);
    let invoke: &'static JNIInvokeInterface_ = Box::leak(Box::new(invoke));
    let vm: *mut JavaVM = Box::leak(Box::new(invoke as *const JNIInvokeInterface_));

    FAKE_VM.store(vm, Ordering::SeqCst);
    FAKE_ENV.store(env, Ordering::SeqCst);
    env
}

struct Batch {
    _strings: Vec<(CString, CString)>,
    methods: Vec<JNINativeMethod>,
}

fn batch(entries: &[(&str, &str, usize)]) -> Batch {
    let strings: Vec<(CString, CString)> = entries
        .iter()
        .map(|(name, sig, _)| (CString::new(*name).unwrap(), CString::new(*sig).unwrap()))
        .collect();
    let methods = strings
        .iter()
        .zip(entries)
        .map(|((name, sig), (_, _, func))| JNINativeMethod {
            name: name.as_ptr() as *mut c_char,
            signature: sig.as_ptr() as *mut c_char,
            fnPtr: *func as *mut c_void,
        })
        .collect();
    Batch {
        _strings: strings,
        methods,
    }
}

fn zygote_batch() -> Batch {
    batch(&[
        ("nativeForkAndSpecialize", FORK_SIG, 0x101),
        ("nativeSpecializeAppProcess", SPECIALIZE_SIG, 0x102),
        ("nativeForkSystemServer", SERVER_SIG, 0x103),
        ("nativePreApplicationInit", "()V", 0x104),
        ("nativeInstallSeccompUidGidFilter", "(II)V", 0x105),
    ])
}

fn runtime_symbols(with_jni_register: bool) -> Arc<Mutex<SymbolTable>> {
    let mut table = SymbolTable::default();
    table.bindings.insert("fork".to_string(), 0x1111);
    table
        .bindings
        .insert("selinux_android_setcontext".to_string(), 0x2222);
    let register = fake_jni_register_native_methods
        as unsafe extern "C" fn(*mut JNIEnv, *const c_char, *const JNINativeMethod, c_int) -> c_int
        as usize;
    if with_jni_register {
        table
            .bindings
            .insert("jniRegisterNativeMethods".to_string(), register);
    } else {
        table.bindings.insert(
            "_ZN7android14AndroidRuntime8setArgv0EPKcb".to_string(),
            0x3333,
        );
        table.exported.insert(
            "_ZN7android14AndroidRuntime21registerNativeMethodsEP7_JNIEnvPKcPK15JNINativeMethodi"
                .to_string(),
            register,
        );
    }
    Arc::new(Mutex::new(table))
}

fn install(symbols: &Arc<Mutex<SymbolTable>>) -> Errno {
    hook_functions(
        Config::default(),
        Box::new(TablePatcher(symbols.clone())),
        Box::new(NeverHide),
        None,
    )
}

fn binding(symbols: &Arc<Mutex<SymbolTable>>, symbol: &str) -> usize {
    symbols.lock().unwrap().bindings[symbol]
}

#[test]
fn unhook_without_install_reports_uninit() {
    let _serial = serial();
    assert_eq!(unhook_functions(), Errno::Uninit);
}

#[test]
fn install_twice_reports_repeat() {
    let _serial = serial();
    let symbols = runtime_symbols(true);
    assert_eq!(install(&symbols), Errno::Ok);
    assert_eq!(install(&symbols), Errno::Repeat);
}

#[test]
fn invalid_library_pattern_aborts_install() {
    let _serial = serial();
    let config = Config {
        runtime_library: "(".to_string(),
        ..Config::default()
    };
    let status = hook_functions(
        config,
        Box::new(TablePatcher(runtime_symbols(true))),
        Box::new(NeverHide),
        None,
    );
    assert_eq!(status, Errno::InvalidArg);
    assert!(!stats().installed);
}

#[test]
fn full_cycle_restores_symbols_and_natives() {
    let _serial = serial();
    take_register_calls();
    REGISTER_RESULT.store(0, Ordering::SeqCst);
    let symbols = runtime_symbols(true);
    assert_eq!(install(&symbols), Errno::Ok);

    let stats_after_install = stats();
    assert!(stats_after_install.installed);
    assert_eq!(stats_after_install.symbol_hooks, 3);
    assert_ne!(binding(&symbols, "fork"), 0x1111);

    let env = fake_env();
    let zygote = zygote_batch();
    let ret = unsafe {
        new_jni_register_native_methods(env, ZYGOTE.as_ptr(), zygote.methods.as_ptr(), 5)
    };
    assert_eq!(ret, 0);

    let other = batch(&[
        ("a", "()V", 0x201),
        ("b", "()V", 0x202),
        ("c", "(I)V", 0x203),
        ("d", "(J)V", 0x204),
        ("e", "()I", 0x205),
    ]);
    let ret = unsafe {
        new_jni_register_native_methods(
            env,
            c"android/os/Binder".as_ptr(),
            other.methods.as_ptr(),
            5,
        )
    };
    assert_eq!(ret, 0);

    let calls = take_register_calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].batch, zygote.methods.as_ptr() as usize);
    assert_eq!(&calls[0].funcs[3..], &[0x104, 0x105]);
    assert!(calls[0].funcs[..3].iter().all(|func| *func >= 0x1000));
    assert_eq!(calls[1].batch, other.methods.as_ptr() as usize);
    assert_eq!(calls[1].funcs, vec![0x201, 0x202, 0x203, 0x204, 0x205]);

    let captured = stats();
    assert_eq!(captured.captured_methods, 10);
    assert_eq!(captured.captured_classes, 2);
    assert_eq!(captured.replaced_methods, 3);
    assert_eq!(captured_native("android/os/Binder", "c", "(I)V"), Some(0x203));
    assert_eq!(
        captured_native("com/android/internal/os/Zygote", "nativeForkAndSpecialize", FORK_SIG),
        Some(0x101)
    );
    assert_eq!(captured_native("android/os/Binder", "c", "(J)V"), None);

    assert_eq!(unhook_functions(), Errno::Ok);
    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].class_name, "com/android/internal/os/Zygote");
    assert_eq!(calls[0].funcs, vec![0x101, 0x102, 0x103]);
    assert_eq!(binding(&symbols, "fork"), 0x1111);
    assert_eq!(binding(&symbols, "selinux_android_setcontext"), 0x2222);

    let after = stats();
    assert!(!after.installed);
    assert_eq!(after.symbol_hooks, 0);
    assert_eq!(after.captured_methods, 0);
    assert_eq!(captured_native("android/os/Binder", "c", "(I)V"), None);
    assert_eq!(unhook_functions(), Errno::Uninit);
}

#[test]
fn missing_jni_register_falls_back_to_set_argv0() {
    let _serial = serial();
    let symbols = runtime_symbols(false);
    assert_eq!(install(&symbols), Errno::Ok);

    // fork、selinux_android_setcontext 与 setArgv0
    assert_eq!(stats().symbol_hooks, 3);
    assert_ne!(
        binding(&symbols, "_ZN7android14AndroidRuntime8setArgv0EPKcb"),
        0x3333
    );
    assert_eq!(
        super::jni_entry::OLD_JNI_REGISTER_NATIVE_METHODS.raw() as usize,
        symbols.lock().unwrap().exported
            ["_ZN7android14AndroidRuntime21registerNativeMethodsEP7_JNIEnvPKcPK15JNINativeMethodi"]
    );
}

#[test]
fn unhook_without_saved_vm_reports_no_env() {
    let _serial = serial();
    let symbols = runtime_symbols(true);
    assert_eq!(install(&symbols), Errno::Ok);
    assert_eq!(unhook_functions(), Errno::NoEnv);
    // 未释放任何东西
    assert!(stats().installed);
    assert_eq!(stats().symbol_hooks, 3);
}

#[test]
fn native_restore_failure_keeps_symbol_hooks() {
    let _serial = serial();
    take_register_calls();
    let symbols = runtime_symbols(true);
    assert_eq!(install(&symbols), Errno::Ok);

    let env = fake_env();
    let zygote = zygote_batch();
    REGISTER_RESULT.store(0, Ordering::SeqCst);
    unsafe { new_jni_register_native_methods(env, ZYGOTE.as_ptr(), zygote.methods.as_ptr(), 5) };
    take_register_calls();

    REGISTER_RESULT.store(-1, Ordering::SeqCst);
    assert_eq!(unhook_functions(), Errno::JniRestore);
    let failed = stats();
    assert!(failed.installed);
    assert_eq!(failed.replaced_methods, 3);
    assert_eq!(failed.captured_methods, 0);
    assert_ne!(binding(&symbols, "fork"), 0x1111);
    assert_eq!(take_register_calls().len(), 1);

    // 注册仍失败时每次重试都再注册一次并继续报告
    assert_eq!(unhook_functions(), Errno::JniRestore);
    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].funcs, vec![0x101, 0x102, 0x103]);
    assert_eq!(stats().replaced_methods, 3);
    assert!(stats().installed);

    REGISTER_RESULT.store(0, Ordering::SeqCst);
    assert_eq!(unhook_functions(), Errno::Ok);
    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].class_name, "com/android/internal/os/Zygote");
    assert_eq!(calls[0].funcs, vec![0x101, 0x102, 0x103]);
    assert_eq!(stats().replaced_methods, 0);
    assert_eq!(binding(&symbols, "fork"), 0x1111);
    assert_eq!(binding(&symbols, "selinux_android_setcontext"), 0x2222);
    assert!(!stats().installed);
}

// 非零返回值原样交回调用方，无论是否为目标类
#[test]
fn jni_register_failure_code_propagates() {
    let _serial = serial();
    take_register_calls();
    let symbols = runtime_symbols(true);
    assert_eq!(install(&symbols), Errno::Ok);

    let env = fake_env();
    let zygote = zygote_batch();
    let other = batch(&[("a", "()V", 0x201)]);
    REGISTER_RESULT.store(-5, Ordering::SeqCst);
    let zygote_ret = unsafe {
        new_jni_register_native_methods(env, ZYGOTE.as_ptr(), zygote.methods.as_ptr(), 5)
    };
    let other_ret = unsafe {
        new_jni_register_native_methods(
            env,
            c"android/os/Binder".as_ptr(),
            other.methods.as_ptr(),
            1,
        )
    };
    REGISTER_RESULT.store(0, Ordering::SeqCst);

    assert_eq!(zygote_ret, -5);
    assert_eq!(other_ret, -5);
    let calls = take_register_calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].batch, zygote.methods.as_ptr() as usize);
    assert_eq!(calls[1].batch, other.methods.as_ptr() as usize);
}

static ENV_REGISTER_RESULT: AtomicI32 = AtomicI32::new(0);

unsafe extern "system" fn fake_env_register_natives(
    _env: *mut JNIEnv,
    clazz: jclass,
    methods: *const JNINativeMethod,
    num_methods: jint,
) -> jint {
    let funcs = (0..num_methods as usize)
        .map(|i| (*methods.add(i)).fnPtr as usize)
        .collect();
    REGISTER_CALLS.lock_or_poison().push(RegisterCall {
        class_name: CStr::from_ptr(clazz as *const c_char)
            .to_string_lossy()
            .into_owned(),
        batch: methods as usize,
        funcs,
    });
    ENV_REGISTER_RESULT.load(Ordering::SeqCst)
}

#[test]
fn env_register_natives_returns_original_result() {
    let _serial = serial();
    take_register_calls();
    let symbols = runtime_symbols(false);
    assert_eq!(install(&symbols), Errno::Ok);
    OLD_ENV_REGISTER_NATIVES
        .set_raw(fake_env_register_natives as RegisterNativesFn as *mut c_void);

    let env = fake_env();
    let zygote = zygote_batch();
    ENV_REGISTER_RESULT.store(-3, Ordering::SeqCst);
    let ret = unsafe {
        new_env_register_natives(
            env,
            c"com.android.internal.os.Zygote".as_ptr() as jclass,
            zygote.methods.as_ptr(),
            5,
        )
    };
    assert_eq!(ret, -3);
    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_ne!(calls[0].batch, zygote.methods.as_ptr() as usize);
    assert_eq!(&calls[0].funcs[3..], &[0x104, 0x105]);
    assert_eq!(stats().replaced_methods, 3);

    let other = batch(&[("a", "()V", 0x201)]);
    ENV_REGISTER_RESULT.store(JNI_OK, Ordering::SeqCst);
    let ret = unsafe {
        new_env_register_natives(
            env,
            c"android.os.Binder".as_ptr() as jclass,
            other.methods.as_ptr(),
            1,
        )
    };
    assert_eq!(ret, JNI_OK);
    let calls = take_register_calls();
    assert_eq!(calls[0].batch, other.methods.as_ptr() as usize);
    assert_eq!(captured_native("android/os/Binder", "a", "()V"), Some(0x201));
}

// 替换函数经原方法转发时收到的全部参数，逐个按 u64 记录
static FORWARDED: Mutex<Vec<u64>> = Mutex::new(Vec::new());
const FORWARD_RESULT: jint = 0x5a5a;

fn take_forwarded() -> Vec<u64> {
    std::mem::take(&mut *FORWARDED.lock_or_poison())
}

macro_rules! forward_recorder {
    ($name:ident -> jint ($($arg:ident: $ty:ty),* $(,)?)) => {
        unsafe extern "system" fn $name(env: *mut JNIEnv, clazz: jclass, $($arg: $ty),*) -> jint {
            *FORWARDED.lock_or_poison() = vec![env as u64, clazz as u64, $($arg as u64),*];
            FORWARD_RESULT
        }
    };
    ($name:ident ($($arg:ident: $ty:ty),* $(,)?)) => {
        unsafe extern "system" fn $name(env: *mut JNIEnv, clazz: jclass, $($arg: $ty),*) {
            *FORWARDED.lock_or_poison() = vec![env as u64, clazz as u64, $($arg as u64),*];
        }
    };
}

forward_recorder!(record_fork_m -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, fds_to_close: jintArray,
    instruction_set: jstring, app_data_dir: jstring,
));
forward_recorder!(record_fork_o -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, fds_to_close: jintArray,
    fds_to_ignore: jintArray, instruction_set: jstring, app_data_dir: jstring,
));
forward_recorder!(record_fork_p -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, fds_to_close: jintArray,
    fds_to_ignore: jintArray, is_child_zygote: jboolean, instruction_set: jstring,
    app_data_dir: jstring,
));
forward_recorder!(record_fork_q_alt -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, fds_to_close: jintArray,
    fds_to_ignore: jintArray, is_child_zygote: jboolean, instruction_set: jstring,
    app_data_dir: jstring, is_top_app: jboolean,
));
forward_recorder!(record_fork_r -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, fds_to_close: jintArray,
    fds_to_ignore: jintArray, is_child_zygote: jboolean, instruction_set: jstring,
    app_data_dir: jstring, is_top_app: jboolean, pkg_data_info_list: jobjectArray,
    whitelisted_data_info_list: jobjectArray, mount_data_dirs: jboolean,
    mount_storage_dirs: jboolean,
));
forward_recorder!(record_fork_samsung_m -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, vendor_arg1: jint, vendor_arg2: jint,
    nice_name: jstring, fds_to_close: jintArray, instruction_set: jstring,
    app_data_dir: jstring,
));
forward_recorder!(record_fork_samsung_n -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, vendor_arg1: jint, vendor_arg2: jint,
    nice_name: jstring, fds_to_close: jintArray, instruction_set: jstring,
    app_data_dir: jstring, vendor_arg3: jint,
));
forward_recorder!(record_fork_samsung_o -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, vendor_arg1: jint, vendor_arg2: jint,
    nice_name: jstring, fds_to_close: jintArray, fds_to_ignore: jintArray,
    instruction_set: jstring, app_data_dir: jstring,
));
forward_recorder!(record_fork_samsung_p -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, vendor_arg1: jint, vendor_arg2: jint,
    nice_name: jstring, fds_to_close: jintArray, fds_to_ignore: jintArray,
    is_child_zygote: jboolean, instruction_set: jstring, app_data_dir: jstring,
));
forward_recorder!(record_specialize_q (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, is_child_zygote: jboolean,
    instruction_set: jstring, app_data_dir: jstring,
));
forward_recorder!(record_specialize_q_alt (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, is_child_zygote: jboolean,
    instruction_set: jstring, app_data_dir: jstring, is_top_app: jboolean,
));
forward_recorder!(record_specialize_r (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, nice_name: jstring, is_child_zygote: jboolean,
    instruction_set: jstring, app_data_dir: jstring, is_top_app: jboolean,
    pkg_data_info_list: jobjectArray, whitelisted_data_info_list: jobjectArray,
    mount_data_dirs: jboolean, mount_storage_dirs: jboolean,
));
forward_recorder!(record_specialize_samsung_q (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    mount_external: jint, se_info: jstring, vendor_arg1: jint, vendor_arg2: jint,
    nice_name: jstring, is_child_zygote: jboolean, instruction_set: jstring,
    app_data_dir: jstring,
));
forward_recorder!(record_server -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, rlimits: jobjectArray,
    permitted_capabilities: jlong, effective_capabilities: jlong,
));
forward_recorder!(record_server_samsung_q -> jint (
    uid: jint, gid: jint, gids: jintArray, runtime_flags: jint, vendor_arg1: jint,
    vendor_arg2: jint, rlimits: jobjectArray, permitted_capabilities: jlong,
    effective_capabilities: jlong,
));

// fork 桩：不真正分叉，返回值决定走父进程还是子进程分支
static FORK_PID: AtomicI32 = AtomicI32::new(0);
static FORK_CALLS: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn fake_fork() -> pid_t {
    FORK_CALLS.fetch_add(1, Ordering::SeqCst);
    FORK_PID.load(Ordering::SeqCst)
}

// 记录 HookContext 交给守护进程的 (uid, 进程名)，一律不隐藏
static HIDE_QUERIES: Mutex<Vec<(i32, String)>> = Mutex::new(Vec::new());

struct RecordingDaemon;

impl HideDaemon for RecordingDaemon {
    fn check_hide(&self, uid: i32, process_name: &str) -> Result<bool, Errno> {
        HIDE_QUERIES
            .lock_or_poison()
            .push((uid, process_name.to_string()));
        Ok(false)
    }

    fn request_hide(&self) -> Result<(), Errno> {
        Ok(())
    }
}

fn take_hide_queries() -> Vec<(i32, String)> {
    std::mem::take(&mut *HIDE_QUERIES.lock_or_poison())
}

fn specialize_env(fork_pid: pid_t) -> *mut JNIEnv {
    FORK_PID.store(fork_pid, Ordering::SeqCst);
    FORK_CALLS.store(0, Ordering::SeqCst);
    OLD_FORK.set_raw(fake_fork as ForkFn as *mut c_void);
    GLOBAL.core.lock_or_poison().hide =
        Some(Arc::new(HideClient::new(Box::new(RecordingDaemon))));
    take_forwarded();
    take_hide_queries();
    fake_env()
}

// 按签名取出替换函数，并把原方法指向记录器
unsafe fn replacement<F: Copy>(signature: &str, recorder: *mut c_void) -> F {
    let (orig, func): (&'static OriginalMethod, usize) = zygote_targets()
        .iter()
        .find_map(|target| {
            target
                .replacements
                .iter()
                .find(|replacement| replacement.signature == signature)
                .map(|replacement| (target.orig, replacement.func))
        })
        .unwrap_or_else(|| panic!("no replacement for {signature}"));
    orig.store(recorder);
    std::mem::transmute_copy::<usize, F>(&func)
}

const CLAZZ: usize = 0x7000;
const UID: jint = 10_061;
const GID: jint = 10_062;
const GIDS: usize = 0x7001;
const RUNTIME_FLAGS: jint = 0x0403;
const RLIMITS: usize = 0x7002;
const MOUNT_EXTERNAL_DEFAULT: jint = 1;
const SE_INFO: usize = 0x7003;
const FDS_TO_CLOSE: usize = 0x7004;
const FDS_TO_IGNORE: usize = 0x7005;
const INSTRUCTION_SET: usize = 0x7006;
const APP_DATA_DIR: usize = 0x7007;
const PKG_DATA_INFO_LIST: usize = 0x7008;
const WHITELISTED_DATA_INFO_LIST: usize = 0x7009;
const VENDOR_ARGS: [jint; 3] = [0x51, 0x52, 0x53];
const PERMITTED_CAPABILITIES: jlong = 0x1_0000_0001;
const EFFECTIVE_CAPABILITIES: jlong = 0x1_0000_0002;
const NICE_NAME: &CStr = c"com.example.forward";

const FORK_M_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_O_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_Q_ALT_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;Z)I";
const FORK_R_SIG: &str = "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;Z[Ljava/lang/String;[Ljava/lang/String;ZZ)I";
const FORK_SAMSUNG_M_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_SAMSUNG_N_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[ILjava/lang/String;Ljava/lang/String;I)I";
const FORK_SAMSUNG_O_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[I[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_SAMSUNG_P_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;)I";
const SPECIALIZE_Q_ALT_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;ZLjava/lang/String;Ljava/lang/String;Z)V";
const SPECIALIZE_R_SIG: &str = "(II[II[[IILjava/lang/String;Ljava/lang/String;ZLjava/lang/String;Ljava/lang/String;Z[Ljava/lang/String;[Ljava/lang/String;ZZ)V";
const SPECIALIZE_SAMSUNG_Q_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;ZLjava/lang/String;Ljava/lang/String;)V";
const SERVER_SAMSUNG_Q_SIG: &str = "(II[IIII[[IJJ)I";

fn nice_name() -> jstring {
    NICE_NAME.as_ptr() as jstring
}

// env、clazz 与各签名共有的前七个参数
fn app_head(env: *mut JNIEnv, mount_external: jint) -> Vec<u64> {
    vec![
        env as u64,
        CLAZZ as u64,
        UID as u64,
        GID as u64,
        GIDS as u64,
        RUNTIME_FLAGS as u64,
        RLIMITS as u64,
        mount_external as u64,
        SE_INFO as u64,
    ]
}

fn expect_app(env: *mut JNIEnv, tail: &[u64]) -> Vec<u64> {
    [app_head(env, MOUNT_EXTERNAL_DEFAULT), tail.to_vec()].concat()
}

fn assert_child_specialized(expected: Vec<u64>, forks: usize) {
    assert_eq!(take_forwarded(), expected);
    assert_eq!(
        take_hide_queries(),
        vec![(UID, NICE_NAME.to_string_lossy().into_owned())]
    );
    assert_eq!(FORK_CALLS.swap(0, Ordering::SeqCst), forks);
    assert_eq!(specialize::current(), None);
}

#[test]
fn fork_and_specialize_replacements_forward_every_argument() {
    let _serial = serial();
    let env = specialize_env(0);
    let clazz = CLAZZ as jclass;
    let (gids, rlimits) = (GIDS as jintArray, RLIMITS as jobjectArray);
    let (se_info, isa, data_dir) = (
        SE_INFO as jstring,
        INSTRUCTION_SET as jstring,
        APP_DATA_DIR as jstring,
    );
    let (close, ignore) = (FDS_TO_CLOSE as jintArray, FDS_TO_IGNORE as jintArray);
    let [v1, v2, v3] = VENDOR_ARGS;
    let nice = nice_name() as u64;
    let (t, f) = (JNI_TRUE as u64, JNI_FALSE as u64);
    let (close_u, ignore_u) = (FDS_TO_CLOSE as u64, FDS_TO_IGNORE as u64);
    let (isa_u, dir_u) = (INSTRUCTION_SET as u64, APP_DATA_DIR as u64);
    let (v1_u, v2_u, v3_u) = (v1 as u64, v2 as u64, v3 as u64);

    unsafe {
        let fork: ForkAndSpecializeM =
            replacement(FORK_M_SIG, record_fork_m as ForkAndSpecializeM as *mut c_void);
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            close,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(expect_app(env, &[nice, close_u, isa_u, dir_u]), 1);

        let fork: ForkAndSpecializeO =
            replacement(FORK_O_SIG, record_fork_o as ForkAndSpecializeO as *mut c_void);
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            close,
            ignore,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(env, &[nice, close_u, ignore_u, isa_u, dir_u]),
            1,
        );

        let fork: ForkAndSpecializeP =
            replacement(FORK_SIG, record_fork_p as ForkAndSpecializeP as *mut c_void);
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            close,
            ignore,
            JNI_TRUE,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(env, &[nice, close_u, ignore_u, t, isa_u, dir_u]),
            1,
        );

        let fork: ForkAndSpecializeQAlt = replacement(
            FORK_Q_ALT_SIG,
            record_fork_q_alt as ForkAndSpecializeQAlt as *mut c_void,
        );
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            close,
            ignore,
            JNI_TRUE,
            isa,
            data_dir,
            JNI_FALSE,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(env, &[nice, close_u, ignore_u, t, isa_u, dir_u, f]),
            1,
        );

        let fork: ForkAndSpecializeR =
            replacement(FORK_R_SIG, record_fork_r as ForkAndSpecializeR as *mut c_void);
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            close,
            ignore,
            JNI_TRUE,
            isa,
            data_dir,
            JNI_FALSE,
            PKG_DATA_INFO_LIST as jobjectArray,
            WHITELISTED_DATA_INFO_LIST as jobjectArray,
            JNI_TRUE,
            JNI_FALSE,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(
                env,
                &[
                    nice,
                    close_u,
                    ignore_u,
                    t,
                    isa_u,
                    dir_u,
                    f,
                    PKG_DATA_INFO_LIST as u64,
                    WHITELISTED_DATA_INFO_LIST as u64,
                    t,
                    f,
                ],
            ),
            1,
        );

        let fork: ForkAndSpecializeSamsungM = replacement(
            FORK_SAMSUNG_M_SIG,
            record_fork_samsung_m as ForkAndSpecializeSamsungM as *mut c_void,
        );
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            v1,
            v2,
            nice_name(),
            close,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(env, &[v1_u, v2_u, nice, close_u, isa_u, dir_u]),
            1,
        );

        let fork: ForkAndSpecializeSamsungN = replacement(
            FORK_SAMSUNG_N_SIG,
            record_fork_samsung_n as ForkAndSpecializeSamsungN as *mut c_void,
        );
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            v1,
            v2,
            nice_name(),
            close,
            isa,
            data_dir,
            v3,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(env, &[v1_u, v2_u, nice, close_u, isa_u, dir_u, v3_u]),
            1,
        );

        let fork: ForkAndSpecializeSamsungO = replacement(
            FORK_SAMSUNG_O_SIG,
            record_fork_samsung_o as ForkAndSpecializeSamsungO as *mut c_void,
        );
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            v1,
            v2,
            nice_name(),
            close,
            ignore,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(env, &[v1_u, v2_u, nice, close_u, ignore_u, isa_u, dir_u]),
            1,
        );

        let fork: ForkAndSpecializeSamsungP = replacement(
            FORK_SAMSUNG_P_SIG,
            record_fork_samsung_p as ForkAndSpecializeSamsungP as *mut c_void,
        );
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            v1,
            v2,
            nice_name(),
            close,
            ignore,
            JNI_TRUE,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_child_specialized(
            expect_app(env, &[v1_u, v2_u, nice, close_u, ignore_u, t, isa_u, dir_u]),
            1,
        );
    }
}

#[test]
fn specialize_app_process_replacements_forward_every_argument() {
    let _serial = serial();
    let env = specialize_env(0);
    let clazz = CLAZZ as jclass;
    let (gids, rlimits) = (GIDS as jintArray, RLIMITS as jobjectArray);
    let (se_info, isa, data_dir) = (
        SE_INFO as jstring,
        INSTRUCTION_SET as jstring,
        APP_DATA_DIR as jstring,
    );
    let [v1, v2, _] = VENDOR_ARGS;
    let nice = nice_name() as u64;
    let (t, f) = (JNI_TRUE as u64, JNI_FALSE as u64);
    let (isa_u, dir_u) = (INSTRUCTION_SET as u64, APP_DATA_DIR as u64);

    unsafe {
        let specialize: SpecializeAppProcessQ = replacement(
            SPECIALIZE_SIG,
            record_specialize_q as SpecializeAppProcessQ as *mut c_void,
        );
        specialize(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            JNI_TRUE,
            isa,
            data_dir,
        );
        // 只特化不 fork
        assert_child_specialized(expect_app(env, &[nice, t, isa_u, dir_u]), 0);

        let specialize: SpecializeAppProcessQAlt = replacement(
            SPECIALIZE_Q_ALT_SIG,
            record_specialize_q_alt as SpecializeAppProcessQAlt as *mut c_void,
        );
        specialize(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            JNI_TRUE,
            isa,
            data_dir,
            JNI_FALSE,
        );
        assert_child_specialized(expect_app(env, &[nice, t, isa_u, dir_u, f]), 0);

        let specialize: SpecializeAppProcessR = replacement(
            SPECIALIZE_R_SIG,
            record_specialize_r as SpecializeAppProcessR as *mut c_void,
        );
        specialize(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            JNI_TRUE,
            isa,
            data_dir,
            JNI_FALSE,
            PKG_DATA_INFO_LIST as jobjectArray,
            WHITELISTED_DATA_INFO_LIST as jobjectArray,
            JNI_TRUE,
            JNI_FALSE,
        );
        assert_child_specialized(
            expect_app(
                env,
                &[
                    nice,
                    t,
                    isa_u,
                    dir_u,
                    f,
                    PKG_DATA_INFO_LIST as u64,
                    WHITELISTED_DATA_INFO_LIST as u64,
                    t,
                    f,
                ],
            ),
            0,
        );

        let specialize: SpecializeAppProcessSamsungQ = replacement(
            SPECIALIZE_SAMSUNG_Q_SIG,
            record_specialize_samsung_q as SpecializeAppProcessSamsungQ as *mut c_void,
        );
        specialize(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            v1,
            v2,
            nice_name(),
            JNI_TRUE,
            isa,
            data_dir,
        );
        assert_child_specialized(
            expect_app(env, &[v1 as u64, v2 as u64, nice, t, isa_u, dir_u]),
            0,
        );
    }
}

#[test]
fn fork_system_server_replacements_forward_every_argument() {
    let _serial = serial();
    let env = specialize_env(0);
    let clazz = CLAZZ as jclass;
    let (gids, rlimits) = (GIDS as jintArray, RLIMITS as jobjectArray);
    let [v1, v2, _] = VENDOR_ARGS;

    unsafe {
        let fork: ForkSystemServer =
            replacement(SERVER_SIG, record_server as ForkSystemServer as *mut c_void);
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            PERMITTED_CAPABILITIES,
            EFFECTIVE_CAPABILITIES,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_eq!(
            take_forwarded(),
            vec![
                env as u64,
                CLAZZ as u64,
                UID as u64,
                GID as u64,
                GIDS as u64,
                RUNTIME_FLAGS as u64,
                RLIMITS as u64,
                PERMITTED_CAPABILITIES as u64,
                EFFECTIVE_CAPABILITIES as u64,
            ]
        );

        let fork: ForkSystemServerSamsungQ = replacement(
            SERVER_SAMSUNG_Q_SIG,
            record_server_samsung_q as ForkSystemServerSamsungQ as *mut c_void,
        );
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            v1,
            v2,
            rlimits,
            PERMITTED_CAPABILITIES,
            EFFECTIVE_CAPABILITIES,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_eq!(
            take_forwarded(),
            vec![
                env as u64,
                CLAZZ as u64,
                UID as u64,
                GID as u64,
                GIDS as u64,
                RUNTIME_FLAGS as u64,
                v1 as u64,
                v2 as u64,
                RLIMITS as u64,
                PERMITTED_CAPABILITIES as u64,
                EFFECTIVE_CAPABILITIES as u64,
            ]
        );
    }
    // system_server 不做隐藏判定
    assert!(take_hide_queries().is_empty());
    assert_eq!(FORK_CALLS.load(Ordering::SeqCst), 2);
    assert_eq!(specialize::current(), None);
}

#[test]
fn fork_replacement_skips_daemon_for_mount_none_and_parent() {
    let _serial = serial();
    let env = specialize_env(0);
    let clazz = CLAZZ as jclass;
    let (gids, rlimits) = (GIDS as jintArray, RLIMITS as jobjectArray);
    let (se_info, isa, data_dir) = (
        SE_INFO as jstring,
        INSTRUCTION_SET as jstring,
        APP_DATA_DIR as jstring,
    );
    let (close, ignore) = (FDS_TO_CLOSE as jintArray, FDS_TO_IGNORE as jintArray);
    let tail = [
        nice_name() as u64,
        FDS_TO_CLOSE as u64,
        FDS_TO_IGNORE as u64,
        JNI_TRUE as u64,
        INSTRUCTION_SET as u64,
        APP_DATA_DIR as u64,
    ];

    unsafe {
        let fork: ForkAndSpecializeP =
            replacement(FORK_SIG, record_fork_p as ForkAndSpecializeP as *mut c_void);

        // MOUNT_EXTERNAL_NONE 的子进程不询问守护进程
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            0,
            se_info,
            nice_name(),
            close,
            ignore,
            JNI_TRUE,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_eq!(take_forwarded(), [app_head(env, 0), tail.to_vec()].concat());
        assert!(take_hide_queries().is_empty());

        // 父进程同样不询问，只转发一次
        FORK_PID.store(4321, Ordering::SeqCst);
        let ret = fork(
            env,
            clazz,
            UID,
            GID,
            gids,
            RUNTIME_FLAGS,
            rlimits,
            MOUNT_EXTERNAL_DEFAULT,
            se_info,
            nice_name(),
            close,
            ignore,
            JNI_TRUE,
            isa,
            data_dir,
        );
        assert_eq!(ret, FORWARD_RESULT);
        assert_eq!(take_forwarded(), expect_app(env, &tail));
        assert!(take_hide_queries().is_empty());
    }
    assert_eq!(FORK_CALLS.load(Ordering::SeqCst), 2);
    assert_eq!(specialize::current(), None);
}

#[test]
fn replacement_without_saved_original_returns_error() {
    let _serial = serial();
    let env = specialize_env(0);
    unsafe {
        let fork: ForkSystemServer = replacement(SERVER_SIG, ptr::null_mut());
        let ret = fork(
            env,
            CLAZZ as jclass,
            UID,
            GID,
            GIDS as jintArray,
            RUNTIME_FLAGS,
            RLIMITS as jobjectArray,
            PERMITTED_CAPABILITIES,
            EFFECTIVE_CAPABILITIES,
        );
        assert_eq!(ret, -1);
    }
    assert!(take_forwarded().is_empty());
}
