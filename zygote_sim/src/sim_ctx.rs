// 模拟 zygote 进程的非 JNI 部分：PLT 绑定表、fork / selinux 桩、AppRuntime 对象、守护进程
use std::collections::BTreeMap;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard};

use jni_sys::JNIEnv;
use libc::{pid_t, uid_t};
use zygote_hook::{
    Config, Errno, HideDaemon, SelfUnloadFn, SymbolPatcher, hook_functions_with,
};

pub const FORK: &str = "fork";
pub const SELINUX_SETCONTEXT: &str = "selinux_android_setcontext";
pub const JNI_REGISTER_NATIVE_METHODS: &str = "jniRegisterNativeMethods";
pub const SET_ARGV0: &str = "_ZN7android14AndroidRuntime8setArgv0EPKcb";
pub const REGISTER_NATIVE_METHODS: &str =
    "_ZN7android14AndroidRuntime21registerNativeMethodsEP7_JNIEnvPKcPK15JNINativeMethodi";

pub type ForkFn = unsafe extern "C" fn() -> pid_t;
pub type SetcontextFn =
    unsafe extern "C" fn(uid_t, c_int, *const c_char, *const c_char) -> c_int;
pub type SetArgv0Fn = unsafe extern "C" fn(*mut c_void, *const c_char, bool);

// libandroid_runtime 的注册入口形态
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkPath {
    // 存在 jniRegisterNativeMethods 导入
    JniHelper,
    // 只能经由 AndroidRuntime::setArgv0 与 JNIEnv 函数表
    RuntimeBridge,
}

// 按事件发生顺序记录，场景据此断言调用次序
static TRACE: Mutex<Vec<String>> = Mutex::new(Vec::new());

pub fn trace(event: impl Into<String>) {
    lock(&TRACE).push(event.into());
}

pub fn take_trace() -> Vec<String> {
    std::mem::take(&mut *lock(&TRACE))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

struct SymbolTable {
    bindings: BTreeMap<String, usize>,
    pending: Vec<(String, usize, usize)>,
    exported: BTreeMap<String, usize>,
}

static SYMBOLS: Mutex<SymbolTable> = Mutex::new(SymbolTable {
    bindings: BTreeMap::new(),
    pending: Vec::new(),
    exported: BTreeMap::new(),
});

// 重建 GOT：fork 与 selinux 总是存在，注册入口按 path 二选一
pub fn reset_symbols(path: LinkPath) {
    let mut table = lock(&SYMBOLS);
    table.bindings.clear();
    table.pending.clear();
    table.exported.clear();
    table
        .bindings
        .insert(FORK.to_string(), sim_fork as ForkFn as usize);
    table.bindings.insert(
        SELINUX_SETCONTEXT.to_string(),
        sim_selinux_android_setcontext as SetcontextFn as usize,
    );
    let register = crate::sim_jni::register_native_methods_addr();
    match path {
        LinkPath::JniHelper => {
            table
                .bindings
                .insert(JNI_REGISTER_NATIVE_METHODS.to_string(), register);
        }
        LinkPath::RuntimeBridge => {
            table
                .bindings
                .insert(SET_ARGV0.to_string(), sim_set_argv0 as SetArgv0Fn as usize);
            table
                .exported
                .insert(REGISTER_NATIVE_METHODS.to_string(), register);
        }
    }
}

pub fn binding(symbol: &str) -> usize {
    lock(&SYMBOLS).bindings.get(symbol).copied().unwrap_or(0)
}

// 按调用方视角经 GOT 取函数，与真实库里的 PLT 调用一致
pub unsafe fn got<F: Copy>(symbol: &str) -> F {
    let addr = binding(symbol);
    assert_ne!(addr, 0, "symbol {symbol} is not bound");
    assert_eq!(size_of::<F>(), size_of::<usize>());
    std::mem::transmute_copy::<usize, F>(&addr)
}

// 与 xhook 语义一致的内存 GOT：register 只登记，refresh 写入并回填原值
pub struct SimPatcher;

impl SymbolPatcher for SimPatcher {
    unsafe fn register(
        &mut self,
        _path_regex: &CStr,
        symbol: &CStr,
        new_func: *mut c_void,
        old_func: *mut *mut c_void,
    ) -> i32 {
        let symbol = symbol.to_string_lossy().into_owned();
        lock(&SYMBOLS)
            .pending
            .push((symbol, new_func as usize, old_func as usize));
        0
    }

    fn refresh(&mut self) -> i32 {
        let mut table = lock(&SYMBOLS);
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
        lock(&SYMBOLS).pending.clear();
    }

    fn lookup(&self, symbol: &CStr) -> *mut c_void {
        let table = lock(&SYMBOLS);
        symbol
            .to_str()
            .ok()
            .and_then(|symbol| table.exported.get(symbol))
            .map_or(ptr::null_mut(), |addr| *addr as *mut c_void)
    }
}

// fork 桩：不真正分叉，返回值决定模拟的是父进程还是子进程
static FORK_PID: AtomicI32 = AtomicI32::new(0);

pub fn set_fork_pid(pid: pid_t) {
    FORK_PID.store(pid, Ordering::SeqCst);
}

pub unsafe extern "C" fn sim_fork() -> pid_t {
    trace("fork");
    FORK_PID.load(Ordering::SeqCst)
}

pub unsafe extern "C" fn sim_selinux_android_setcontext(
    uid: uid_t,
    _is_system_server: c_int,
    _seinfo: *const c_char,
    _pkgname: *const c_char,
) -> c_int {
    trace(format!("setcontext:{uid}"));
    0
}

pub unsafe extern "C" fn sim_set_argv0(_this: *mut c_void, argv0: *const c_char, _set: bool) {
    let argv0 = if argv0.is_null() {
        String::new()
    } else {
        CStr::from_ptr(argv0).to_string_lossy().into_owned()
    };
    trace(format!("setArgv0:{argv0}"));
}

// 与 android::AndroidRuntime 相同布局的虚表
#[repr(C)]
pub struct SimVtable {
    rtti: *const c_void,
    dtor: *const c_void,
    on_vm_created: unsafe extern "C" fn(*mut c_void, *mut JNIEnv),
    on_started: unsafe extern "C" fn(*mut c_void),
    on_zygote_init: unsafe extern "C" fn(*mut c_void),
    on_exit: unsafe extern "C" fn(*mut c_void, c_int),
}

#[repr(C)]
pub struct SimRuntime {
    vptr: *const SimVtable,
}

unsafe extern "C" fn sim_on_vm_created(_this: *mut c_void, _env: *mut JNIEnv) {
    trace("onVmCreated");
}

unsafe extern "C" fn sim_on_started(_this: *mut c_void) {
    trace("onStarted");
}

unsafe extern "C" fn sim_on_zygote_init(_this: *mut c_void) {
    trace("onZygoteInit");
}

unsafe extern "C" fn sim_on_exit(_this: *mut c_void, code: c_int) {
    trace(format!("onExit:{code}"));
}

impl SimRuntime {
    // 进程级单例，泄漏以保持地址稳定
    pub fn leak() -> &'static mut SimRuntime {
        let vtable: &'static SimVtable = Box::leak(Box::new(SimVtable {
            rtti: ptr::null(),
            dtor: ptr::null(),
            on_vm_created: sim_on_vm_created,
            on_started: sim_on_started,
            on_zygote_init: sim_on_zygote_init,
            on_exit: sim_on_exit,
        }));
        Box::leak(Box::new(SimRuntime { vptr: vtable }))
    }

    pub fn as_ptr(&mut self) -> *mut c_void {
        self as *mut SimRuntime as *mut c_void
    }

    // vptr 会被外部经裸指针改写
    fn current_vtable(&self) -> *const SimVtable {
        unsafe { ptr::read_volatile(&self.vptr) }
    }

    pub fn vptr(&self) -> usize {
        self.current_vtable() as usize
    }

    // 与 C++ 虚调用一样经 vptr 分派
    pub unsafe fn on_vm_created(&mut self, env: *mut JNIEnv) {
        let on_vm_created = (*self.current_vtable()).on_vm_created;
        on_vm_created(self.as_ptr(), env);
    }

    pub unsafe fn on_started(&mut self) {
        let on_started = (*self.current_vtable()).on_started;
        on_started(self.as_ptr());
    }
}

// 守护进程：名单内的进程需要隐藏
static HIDDEN: Mutex<Vec<String>> = Mutex::new(Vec::new());

pub fn set_hidden(names: &[&str]) {
    *lock(&HIDDEN) = names.iter().map(|name| name.to_string()).collect();
}

pub struct SimDaemon;

impl HideDaemon for SimDaemon {
    fn check_hide(&self, uid: i32, process_name: &str) -> Result<bool, Errno> {
        trace(format!("check_hide:{uid}:{process_name}"));
        Ok(lock(&HIDDEN).iter().any(|name| name == process_name))
    }

    fn request_hide(&self) -> Result<(), Errno> {
        trace("request_hide");
        Ok(())
    }
}

pub unsafe extern "C" fn sim_unload() {
    trace("unload");
}

pub fn ensure_ok(code: Errno, op: &str) {
    assert_eq!(code, Errno::Ok, "{op} failed: {code:?}");
}

pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

pub fn sim_config() -> Config {
    Config {
        debug: env_flag("ZYGOTE_SIM_DEBUG"),
        ..Config::default()
    }
}

// 以模拟 GOT 与守护进程安装
pub fn install(unloader: Option<SelfUnloadFn>) -> Errno {
    hook_functions_with(
        sim_config(),
        Box::new(SimPatcher),
        Box::new(SimDaemon),
        unloader,
    )
}
