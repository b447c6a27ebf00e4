use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use jni_sys::JNI_OK;
use zygote_hook::{Errno, is_installed, stats, unhook_functions};

use crate::sim_ctx::{
    FORK, ForkFn, LinkPath, SELINUX_SETCONTEXT, SET_ARGV0, SetArgv0Fn, SetcontextFn, SimRuntime,
    binding, ensure_ok, got, install, reset_symbols, set_fork_pid, set_hidden, sim_fork,
    sim_selinux_android_setcontext, sim_set_argv0, sim_unload, take_trace,
};
use crate::sim_jni::{
    MOUNT_EXTERNAL_DEFAULT, MOUNT_EXTERNAL_NONE, ZYGOTE_CLASS, ZygoteEntries, binder_batch,
    env_register_natives, env_table_is_original, global_refs, jclass_of, original_zygote_funcs,
    set_register_result, sim_env, take_register_calls, zygote_batch,
};

static RUNTIME: AtomicPtr<SimRuntime> = AtomicPtr::new(ptr::null_mut());
static ORIGINAL_VPTR: AtomicUsize = AtomicUsize::new(0);
static ENTRIES: Mutex<Option<ZygoteEntries>> = Mutex::new(None);

fn runtime() -> &'static mut SimRuntime {
    let runtime = RUNTIME.load(Ordering::SeqCst);
    assert!(!runtime.is_null(), "AppRuntime not created");
    unsafe { &mut *runtime }
}

fn entries() -> ZygoteEntries {
    let entries = *ENTRIES.lock().unwrap_or_else(|e| e.into_inner());
    entries.expect("Zygote natives not registered")
}

pub unsafe fn scenario_install_through_set_argv0() {
    reset_symbols(LinkPath::RuntimeBridge);
    take_trace();
    take_register_calls();
    set_register_result(JNI_OK);

    ensure_ok(install(Some(sim_unload)), "install bridge");
    assert!(is_installed());
    assert_eq!(install(None), Errno::Repeat);
    // fork、selinux_android_setcontext、setArgv0
    assert_eq!(stats().symbol_hooks, 3);
    assert_ne!(binding(SET_ARGV0), sim_set_argv0 as SetArgv0Fn as usize);

    let runtime = SimRuntime::leak();
    let original_vptr = runtime.vptr();
    ORIGINAL_VPTR.store(original_vptr, Ordering::SeqCst);
    RUNTIME.store(runtime as *mut SimRuntime, Ordering::SeqCst);

    let set_argv0: SetArgv0Fn = got(SET_ARGV0);
    set_argv0(runtime.as_ptr(), c"zygote64".as_ptr(), true);
    let swapped = runtime.vptr();
    assert_ne!(swapped, original_vptr, "vtable not swapped by setArgv0");

    // 只替换一次，其余虚函数仍指向原实现
    set_argv0(runtime.as_ptr(), c"zygote64".as_ptr(), true);
    assert_eq!(runtime.vptr(), swapped);
    runtime.on_started();
    assert_eq!(
        take_trace(),
        ["setArgv0:zygote64", "setArgv0:zygote64", "onStarted"]
    );
}

pub unsafe fn scenario_vm_created_swaps_env_table() {
    let runtime = runtime();
    let env = sim_env();
    assert!(env_table_is_original());

    runtime.on_vm_created(env);
    assert_eq!(take_trace(), ["onVmCreated"]);
    assert_eq!(
        runtime.vptr(),
        ORIGINAL_VPTR.load(Ordering::SeqCst),
        "vtable not restored after onVmCreated"
    );
    assert!(!env_table_is_original());
    assert!(stats().env_table_active);
}

pub unsafe fn scenario_register_natives_through_env() {
    let env = sim_env();
    let zygote = zygote_batch();
    assert_eq!(
        env_register_natives(env, jclass_of(ZYGOTE_CLASS), &zygote),
        JNI_OK
    );
    let binder = binder_batch();
    assert_eq!(
        env_register_natives(env, jclass_of("android/os/Binder"), &binder),
        JNI_OK
    );

    let calls = take_register_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].path, "env");
    assert_eq!(calls[0].class_name, ZYGOTE_CLASS);
    assert_ne!(calls[0].batch, zygote.as_ptr() as usize);
    assert_eq!(&calls[0].funcs[3..], &[0x104, 0x105]);
    let zygote_entries = ZygoteEntries::from_call(&calls[0]);
    assert!(zygote_entries.replaced(), "Zygote natives not replaced");

    // 非目标类原样转发
    assert_eq!(calls[1].class_name, "android/os/Binder");
    assert_eq!(calls[1].batch, binder.as_ptr() as usize);
    assert_eq!(calls[1].funcs, vec![0x201, 0x202, 0x203]);

    let snapshot = stats();
    assert_eq!(snapshot.captured_methods, 8);
    assert_eq!(snapshot.captured_classes, 2);
    assert_eq!(snapshot.replaced_methods, 3);
    // java/lang/Class 的全局引用
    assert_eq!(global_refs(), 1);

    *ENTRIES.lock().unwrap_or_else(|e| e.into_inner()) = Some(zygote_entries);
    take_trace();
}

pub unsafe fn scenario_fork_parent() {
    set_fork_pid(4242);
    set_hidden(&["com.example.hidden"]);
    let pid = entries().fork_and_specialize(
        sim_env(),
        10123,
        MOUNT_EXTERNAL_DEFAULT,
        "com.example.hidden",
    );
    assert_eq!(pid, 4242);
    // 原方法内部的 fork 拿到同一个 pid，父进程不询问守护进程
    assert_eq!(take_trace(), ["fork", "orig:forkAndSpecialize:4242"]);
    assert!(is_installed());
}

pub unsafe fn scenario_fork_child_visible() {
    set_fork_pid(0);
    set_hidden(&["com.example.hidden"]);
    let pid = entries().fork_and_specialize(
        sim_env(),
        10123,
        MOUNT_EXTERNAL_DEFAULT,
        "com.example.visible",
    );
    assert_eq!(pid, 0);
    assert_eq!(
        take_trace(),
        [
            "fork",
            "check_hide:10123:com.example.visible",
            "orig:forkAndSpecialize:0",
            "setcontext:10123",
        ]
    );
    assert!(is_installed());
}

pub unsafe fn scenario_fork_child_mount_none() {
    set_fork_pid(0);
    set_hidden(&["com.example.hidden"]);
    let pid = entries().fork_and_specialize(
        sim_env(),
        10125,
        MOUNT_EXTERNAL_NONE,
        "com.example.hidden",
    );
    assert_eq!(pid, 0);
    assert_eq!(
        take_trace(),
        ["fork", "orig:forkAndSpecialize:0", "setcontext:10125"]
    );
    assert!(is_installed());
}

pub unsafe fn scenario_fork_child_hidden_unloads() {
    set_fork_pid(0);
    set_hidden(&["com.example.hidden"]);
    let pid = entries().fork_and_specialize(
        sim_env(),
        10124,
        MOUNT_EXTERNAL_DEFAULT,
        "com.example.hidden",
    );
    assert_eq!(pid, 0);
    // 切换 SELinux 上下文前通知守护进程，原方法返回后卸载并回调加载器
    assert_eq!(
        take_trace(),
        [
            "fork",
            "check_hide:10124:com.example.hidden",
            "orig:forkAndSpecialize:0",
            "request_hide",
            "setcontext:10124",
            "register:helper:com/android/internal/os/Zygote",
            "unload",
        ]
    );

    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].funcs, original_zygote_funcs());

    assert!(!is_installed());
    assert!(env_table_is_original());
    assert_eq!(global_refs(), 0);
    assert_eq!(binding(FORK), sim_fork as ForkFn as usize);
    assert_eq!(
        binding(SELINUX_SETCONTEXT),
        sim_selinux_android_setcontext as SetcontextFn as usize
    );
    assert_eq!(binding(SET_ARGV0), sim_set_argv0 as SetArgv0Fn as usize);
}

pub unsafe fn scenario_teardown_after_unload() {
    assert_eq!(unhook_functions(), Errno::Uninit);
    let snapshot = stats();
    assert_eq!(snapshot.symbol_hooks, 0);
    assert_eq!(snapshot.captured_methods, 0);
    assert!(!snapshot.env_table_active);
    assert!(take_trace().is_empty());
}
