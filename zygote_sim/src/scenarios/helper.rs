use jni_sys::{JNI_ERR, JNI_OK};
use zygote_hook::{Errno, is_installed, stats, unhook_functions};

use crate::sim_ctx::{
    FORK, ForkFn, JNI_REGISTER_NATIVE_METHODS, LinkPath, binding, ensure_ok, install,
    reset_symbols, set_fork_pid, set_hidden, sim_fork, take_trace,
};
use crate::sim_jni::{
    MOUNT_EXTERNAL_DEFAULT, ZygoteEntries, helper_register_natives, original_zygote_funcs,
    register_native_methods_addr, set_register_result, sim_env, take_register_calls,
    zygote_batch,
};

// 以 jniRegisterNativeMethods 路径安装并注册 Zygote 方法表
unsafe fn install_and_register() -> ZygoteEntries {
    reset_symbols(LinkPath::JniHelper);
    take_trace();
    take_register_calls();
    set_register_result(JNI_OK);
    ensure_ok(install(None), "install helper");
    // fork、selinux_android_setcontext、jniRegisterNativeMethods
    assert_eq!(stats().symbol_hooks, 3);
    assert_ne!(
        binding(JNI_REGISTER_NATIVE_METHODS),
        register_native_methods_addr()
    );

    let zygote = zygote_batch();
    let ret = helper_register_natives(sim_env(), c"com/android/internal/os/Zygote", &zygote);
    assert_eq!(ret, JNI_OK);
    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "helper");
    assert_ne!(calls[0].batch, zygote.as_ptr() as usize);
    let entries = ZygoteEntries::from_call(&calls[0]);
    assert!(entries.replaced(), "Zygote natives not replaced");
    assert_eq!(stats().replaced_methods, 3);
    take_trace();
    entries
}

pub unsafe fn scenario_helper_cycle() {
    let entries = install_and_register();
    let env = sim_env();
    set_hidden(&[]);

    set_fork_pid(1234);
    assert_eq!(entries.fork_system_server(env), 1234);
    assert_eq!(take_trace(), ["fork", "orig:forkSystemServer:1234"]);

    set_fork_pid(0);
    assert_eq!(entries.fork_system_server(env), 0);
    assert_eq!(
        take_trace(),
        ["fork", "orig:forkSystemServer:0", "setcontext:1000"]
    );

    // 仅特化不 fork
    entries.specialize_app_process(env, 10130, MOUNT_EXTERNAL_DEFAULT, "com.example.isolated");
    assert_eq!(
        take_trace(),
        [
            "check_hide:10130:com.example.isolated",
            "orig:specializeAppProcess",
            "setcontext:10130",
        ]
    );
    assert!(is_installed());

    ensure_ok(unhook_functions(), "unhook helper");
    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].class_name, "com/android/internal/os/Zygote");
    assert_eq!(calls[0].funcs, original_zygote_funcs());
    assert_eq!(
        binding(JNI_REGISTER_NATIVE_METHODS),
        register_native_methods_addr()
    );
    assert_eq!(binding(FORK), sim_fork as ForkFn as usize);
    assert_eq!(unhook_functions(), Errno::Uninit);
    take_trace();
}

pub unsafe fn scenario_restore_failure_retry() {
    install_and_register();

    set_register_result(JNI_ERR);
    assert_eq!(unhook_functions(), Errno::JniRestore);
    assert!(is_installed());
    assert_ne!(binding(FORK), sim_fork as ForkFn as usize);
    assert_eq!(take_register_calls().len(), 1);

    // 替换记录保留，重试仍先注册原方法
    assert_eq!(unhook_functions(), Errno::JniRestore);
    assert_eq!(take_register_calls().len(), 1);
    assert_eq!(stats().replaced_methods, 3);

    set_register_result(JNI_OK);
    ensure_ok(unhook_functions(), "unhook retry");
    let calls = take_register_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].funcs, original_zygote_funcs());
    assert_eq!(binding(FORK), sim_fork as ForkFn as usize);
    assert!(!is_installed());
    take_trace();
}
