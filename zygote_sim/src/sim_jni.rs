// 模拟 ART 的 JNI 表面：JNIEnv / JavaVM 函数表、类与字符串对象、注册记录、Zygote 原始 native 方法
// 对象模型：jclass 与 jstring 都指向泄漏的 C 字符串，类对象的内容即其 Class.getName 结果
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};

use jni_sys::{
    JNI_OK, JNIEnv, JNIInvokeInterface_, JNINativeInterface_, JNINativeMethod, JavaVM, jboolean,
    jclass, jint, jintArray, jlong, jmethodID, jobject, jobjectArray, jstring, jvalue,
};
use libc::pid_t;

use crate::sim_ctx::{FORK, ForkFn, SELINUX_SETCONTEXT, SetcontextFn, got, trace};

pub const ZYGOTE_CLASS: &str = "com/android/internal/os/Zygote";

pub const FORK_AND_SPECIALIZE_SIG: &str = "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;)I";
pub const SPECIALIZE_APP_PROCESS_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;ZLjava/lang/String;Ljava/lang/String;)V";
pub const FORK_SYSTEM_SERVER_SIG: &str = "(II[II[[IJJ)I";

pub const MOUNT_EXTERNAL_NONE: jint = 0;
pub const MOUNT_EXTERNAL_DEFAULT: jint = 1;

pub type ForkAndSpecializeFn = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jint,
    jstring,
    jstring,
    jintArray,
    jintArray,
    jboolean,
    jstring,
    jstring,
) -> jint;

pub type SpecializeAppProcessFn = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jint,
    jstring,
    jstring,
    jboolean,
    jstring,
    jstring,
);

pub type ForkSystemServerFn = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jlong,
    jlong,
) -> jint;

type RegisterNativeMethodsFn =
    unsafe extern "C" fn(*mut JNIEnv, *const c_char, *const JNINativeMethod, c_int) -> c_int;

// Java 侧字符串或类对象，进程内泄漏
pub fn jstr(text: &str) -> jstring {
    let text = CString::new(text).unwrap_or_default();
    CString::into_raw(text) as jstring
}

// 内部名 a/b/C 对应的类对象
pub fn jclass_of(internal_name: &str) -> jclass {
    jstr(&internal_name.replace('/', ".")) as jclass
}

unsafe fn object_text(obj: jobject) -> String {
    if obj.is_null() {
        return String::new();
    }
    CStr::from_ptr(obj as *const c_char)
        .to_string_lossy()
        .into_owned()
}

// 宿主侧收到的一次注册：走哪条路径、类名、函数指针与数组地址
#[derive(Clone, Debug)]
pub struct RegisterCall {
    pub path: &'static str,
    pub class_name: String,
    pub batch: usize,
    pub funcs: Vec<usize>,
}

static REGISTER_CALLS: Mutex<Vec<RegisterCall>> = Mutex::new(Vec::new());
static REGISTER_RESULT: AtomicI32 = AtomicI32::new(JNI_OK);

pub fn set_register_result(result: jint) {
    REGISTER_RESULT.store(result, Ordering::SeqCst);
}

pub fn take_register_calls() -> Vec<RegisterCall> {
    let mut calls = REGISTER_CALLS.lock().unwrap_or_else(|e| e.into_inner());
    std::mem::take(&mut *calls)
}

unsafe fn record_register(
    path: &'static str,
    class_name: String,
    methods: *const JNINativeMethod,
    count: c_int,
) -> c_int {
    let funcs = (0..count.max(0) as usize)
        .map(|i| (*methods.add(i)).fnPtr as usize)
        .collect();
    trace(format!("register:{path}:{class_name}"));
    REGISTER_CALLS
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(RegisterCall {
            path,
            class_name,
            batch: methods as usize,
            funcs,
        });
    REGISTER_RESULT.load(Ordering::SeqCst)
}

// jniRegisterNativeMethods 与 AndroidRuntime::registerNativeMethods 共用
unsafe extern "C" fn sim_register_native_methods(
    _env: *mut JNIEnv,
    class_name: *const c_char,
    methods: *const JNINativeMethod,
    num_methods: c_int,
) -> c_int {
    let class_name = object_text(class_name as jobject);
    record_register("helper", class_name, methods, num_methods)
}

pub fn register_native_methods_addr() -> usize {
    sim_register_native_methods as RegisterNativeMethodsFn as usize
}

unsafe extern "system" fn sim_env_register_natives(
    _env: *mut JNIEnv,
    clazz: jclass,
    methods: *const JNINativeMethod,
    num_methods: jint,
) -> jint {
    let class_name = object_text(clazz).replace('.', "/");
    record_register("env", class_name, methods, num_methods)
}

// 全局引用计数，用于确认类名缓存被释放
static GLOBAL_REFS: AtomicI32 = AtomicI32::new(0);

pub fn global_refs() -> i32 {
    GLOBAL_REFS.load(Ordering::SeqCst)
}

unsafe extern "system" fn sim_find_class(_env: *mut JNIEnv, name: *const c_char) -> jclass {
    if name.is_null() {
        return ptr::null_mut();
    }
    jclass_of(&CStr::from_ptr(name).to_string_lossy())
}

unsafe extern "system" fn sim_new_global_ref(_env: *mut JNIEnv, obj: jobject) -> jobject {
    GLOBAL_REFS.fetch_add(1, Ordering::SeqCst);
    obj
}

unsafe extern "system" fn sim_delete_global_ref(_env: *mut JNIEnv, _obj: jobject) {
    GLOBAL_REFS.fetch_sub(1, Ordering::SeqCst);
}

unsafe extern "system" fn sim_delete_local_ref(_env: *mut JNIEnv, _obj: jobject) {}

unsafe extern "system" fn sim_get_method_id(
    _env: *mut JNIEnv,
    _clazz: jclass,
    name: *const c_char,
    _sig: *const c_char,
) -> jmethodID {
    if CStr::from_ptr(name).to_bytes() == b"getName" {
        1usize as jmethodID
    } else {
        ptr::null_mut()
    }
}

// 只支持 Class.getName：类对象本身就是其名字
unsafe extern "system" fn sim_call_object_method_a(
    _env: *mut JNIEnv,
    obj: jobject,
    _method: jmethodID,
    _args: *const jvalue,
) -> jobject {
    obj
}

unsafe extern "system" fn sim_get_string_utf_chars(
    _env: *mut JNIEnv,
    value: jstring,
    is_copy: *mut jboolean,
) -> *const c_char {
    if !is_copy.is_null() {
        *is_copy = 0;
    }
    value as *const c_char
}

unsafe extern "system" fn sim_release_string_utf_chars(
    _env: *mut JNIEnv,
    _value: jstring,
    _chars: *const c_char,
) {
}

unsafe extern "system" fn sim_exception_check(_env: *mut JNIEnv) -> jboolean {
    0
}

unsafe extern "system" fn sim_exception_clear(_env: *mut JNIEnv) {}

static SIM_VM: AtomicPtr<JavaVM> = AtomicPtr::new(ptr::null_mut());
static SIM_ENV: AtomicPtr<JNIEnv> = AtomicPtr::new(ptr::null_mut());
static SIM_TABLE: AtomicPtr<JNINativeInterface_> = AtomicPtr::new(ptr::null_mut());

unsafe extern "system" fn sim_get_java_vm(_env: *mut JNIEnv, vm: *mut *mut JavaVM) -> jint {
    *vm = SIM_VM.load(Ordering::SeqCst);
    JNI_OK
}

unsafe extern "system" fn sim_get_env(
    _vm: *mut JavaVM,
    penv: *mut *mut c_void,
    _version: jint,
) -> jint {
    *penv = SIM_ENV.load(Ordering::SeqCst) as *mut c_void;
    JNI_OK
}

// zygote 主线程的 JNIEnv，首次调用时创建
pub fn sim_env() -> *mut JNIEnv {
    let existing = SIM_ENV.load(Ordering::SeqCst);
    if !existing.is_null() {
        return existing;
    }

    let mut table: JNINativeInterface_ = unsafe { std::mem::zeroed() };
    table.FindClass = Some(sim_find_class);
    table.NewGlobalRef = Some(sim_new_global_ref);
    table.DeleteGlobalRef = Some(sim_delete_global_ref);
    table.DeleteLocalRef = Some(sim_delete_local_ref);
    table.GetMethodID = Some(sim_get_method_id);
    table.CallObjectMethodA = Some(sim_call_object_method_a);
    table.GetStringUTFChars = Some(sim_get_string_utf_chars);
    table.ReleaseStringUTFChars = Some(sim_release_string_utf_chars);
    table.ExceptionCheck = Some(sim_exception_check);
    table.ExceptionClear = Some(sim_exception_clear);
    table.GetJavaVM = Some(sim_get_java_vm);
    table.RegisterNatives = Some(sim_env_register_natives);
    let table: &'static mut JNINativeInterface_ = Box::leak(Box::new(table));
    let env: *mut JNIEnv = Box::leak(Box::new(&*table as *const JNINativeInterface_));

    let mut invoke: JNIInvokeInterface_ = unsafe { std::mem::zeroed() };
    invoke.GetEnv = Some(sim_get_env);
    let invoke: &'static JNIInvokeInterface_ = Box::leak(Box::new(invoke));
    let vm: *mut JavaVM = Box::leak(Box::new(invoke as *const JNIInvokeInterface_));

    SIM_TABLE.store(table, Ordering::SeqCst);
    SIM_VM.store(vm, Ordering::SeqCst);
    SIM_ENV.store(env, Ordering::SeqCst);
    env
}

// env 当前的函数表是否为 ART 原始表
pub fn env_table_is_original() -> bool {
    let env = sim_env();
    unsafe { ptr::eq(*env, SIM_TABLE.load(Ordering::SeqCst)) }
}

// 经由 env 当前函数表调用 RegisterNatives，与 ART 注册路径相同
pub unsafe fn env_register_natives(
    env: *mut JNIEnv,
    class: jclass,
    methods: &[JNINativeMethod],
) -> jint {
    let register = (**env)
        .RegisterNatives
        .expect("JNIEnv RegisterNatives missing");
    register(env, class, methods.as_ptr(), methods.len() as jint)
}

// libandroid_runtime 内部的调用：经 GOT 中的 jniRegisterNativeMethods
pub unsafe fn helper_register_natives(
    env: *mut JNIEnv,
    class_name: &CStr,
    methods: &[JNINativeMethod],
) -> c_int {
    let register: RegisterNativeMethodsFn = got(crate::sim_ctx::JNI_REGISTER_NATIVE_METHODS);
    register(
        env,
        class_name.as_ptr(),
        methods.as_ptr(),
        methods.len() as c_int,
    )
}

fn method(name: &str, signature: &str, func: usize) -> JNINativeMethod {
    JNINativeMethod {
        name: jstr(name) as *mut c_char,
        signature: jstr(signature) as *mut c_char,
        fnPtr: func as *mut c_void,
    }
}

// Zygote 的 native 方法表，前三项为原始实现
pub fn zygote_batch() -> Vec<JNINativeMethod> {
    vec![
        method(
            "nativeForkAndSpecialize",
            FORK_AND_SPECIALIZE_SIG,
            orig_fork_and_specialize as ForkAndSpecializeFn as usize,
        ),
        method(
            "nativeSpecializeAppProcess",
            SPECIALIZE_APP_PROCESS_SIG,
            orig_specialize_app_process as SpecializeAppProcessFn as usize,
        ),
        method(
            "nativeForkSystemServer",
            FORK_SYSTEM_SERVER_SIG,
            orig_fork_system_server as ForkSystemServerFn as usize,
        ),
        method("nativePreApplicationInit", "()V", 0x104),
        method("nativeInstallSeccompUidGidFilter", "(II)V", 0x105),
    ]
}

pub fn original_zygote_funcs() -> Vec<usize> {
    vec![
        orig_fork_and_specialize as ForkAndSpecializeFn as usize,
        orig_specialize_app_process as SpecializeAppProcessFn as usize,
        orig_fork_system_server as ForkSystemServerFn as usize,
    ]
}

pub fn binder_batch() -> Vec<JNINativeMethod> {
    vec![
        method("getCallingPid", "()I", 0x201),
        method("getCallingUid", "()I", 0x202),
        method("clearCallingIdentity", "()J", 0x203),
    ]
}

// 原始实现内部经 GOT 调用 fork 与 selinux_android_setcontext
unsafe fn fork_then_setcontext(name: &str, uid: jint, is_system_server: c_int) -> pid_t {
    let fork: ForkFn = got(FORK);
    let pid = fork();
    trace(format!("orig:{name}:{pid}"));
    if pid == 0 {
        let setcontext: SetcontextFn = got(SELINUX_SETCONTEXT);
        setcontext(uid as u32, is_system_server, ptr::null(), ptr::null());
    }
    pid
}

unsafe extern "system" fn orig_fork_and_specialize(
    _env: *mut JNIEnv,
    _clazz: jclass,
    uid: jint,
    _gid: jint,
    _gids: jintArray,
    _runtime_flags: jint,
    _rlimits: jobjectArray,
    _mount_external: jint,
    _se_info: jstring,
    _nice_name: jstring,
    _fds_to_close: jintArray,
    _fds_to_ignore: jintArray,
    _is_child_zygote: jboolean,
    _instruction_set: jstring,
    _app_data_dir: jstring,
) -> jint {
    fork_then_setcontext("forkAndSpecialize", uid, 0)
}

unsafe extern "system" fn orig_specialize_app_process(
    _env: *mut JNIEnv,
    _clazz: jclass,
    uid: jint,
    _gid: jint,
    _gids: jintArray,
    _runtime_flags: jint,
    _rlimits: jobjectArray,
    _mount_external: jint,
    _se_info: jstring,
    _nice_name: jstring,
    _is_child_zygote: jboolean,
    _instruction_set: jstring,
    _app_data_dir: jstring,
) {
    trace("orig:specializeAppProcess");
    let setcontext: SetcontextFn = got(SELINUX_SETCONTEXT);
    setcontext(uid as u32, 0, ptr::null(), ptr::null());
}

unsafe extern "system" fn orig_fork_system_server(
    _env: *mut JNIEnv,
    _clazz: jclass,
    uid: jint,
    _gid: jint,
    _gids: jintArray,
    _runtime_flags: jint,
    _rlimits: jobjectArray,
    _permitted: jlong,
    _effective: jlong,
) -> jint {
    fork_then_setcontext("forkSystemServer", uid, 1)
}

// 注册后宿主实际拿到的 Zygote 入口
#[derive(Clone, Copy, Debug)]
pub struct ZygoteEntries {
    pub fork_and_specialize: usize,
    pub specialize_app_process: usize,
    pub fork_system_server: usize,
}

impl ZygoteEntries {
    pub fn from_call(call: &RegisterCall) -> Self {
        assert!(call.funcs.len() >= 3, "short Zygote batch");
        Self {
            fork_and_specialize: call.funcs[0],
            specialize_app_process: call.funcs[1],
            fork_system_server: call.funcs[2],
        }
    }

    pub fn replaced(&self) -> bool {
        let originals = original_zygote_funcs();
        originals[0] != self.fork_and_specialize
            && originals[1] != self.specialize_app_process
            && originals[2] != self.fork_system_server
    }

    // 以 Java 层 Zygote.forkAndSpecialize 的方式调用
    pub unsafe fn fork_and_specialize(
        &self,
        env: *mut JNIEnv,
        uid: jint,
        mount_external: jint,
        nice_name: &str,
    ) -> jint {
        let func: ForkAndSpecializeFn = std::mem::transmute(self.fork_and_specialize);
        func(
            env,
            jclass_of(ZYGOTE_CLASS),
            uid,
            uid,
            ptr::null_mut(),
            0,
            ptr::null_mut(),
            mount_external,
            ptr::null_mut(),
            jstr(nice_name),
            ptr::null_mut(),
            ptr::null_mut(),
            0,
            ptr::null_mut(),
            ptr::null_mut(),
        )
    }

    pub unsafe fn specialize_app_process(
        &self,
        env: *mut JNIEnv,
        uid: jint,
        mount_external: jint,
        nice_name: &str,
    ) {
        let func: SpecializeAppProcessFn = std::mem::transmute(self.specialize_app_process);
        func(
            env,
            jclass_of(ZYGOTE_CLASS),
            uid,
            uid,
            ptr::null_mut(),
            0,
            ptr::null_mut(),
            mount_external,
            ptr::null_mut(),
            jstr(nice_name),
            0,
            ptr::null_mut(),
            ptr::null_mut(),
        )
    }

    pub unsafe fn fork_system_server(&self, env: *mut JNIEnv) -> jint {
        let func: ForkSystemServerFn = std::mem::transmute(self.fork_system_server);
        func(
            env,
            jclass_of(ZYGOTE_CLASS),
            1000,
            1000,
            ptr::null_mut(),
            0,
            ptr::null_mut(),
            0,
            0,
        )
    }
}
