// Zygote 特化 native 方法的替换实现，覆盖 Android 6.0 至 11 的各个签名
// 以及 Android 10 的另一种签名与三星 ROM 的定制签名
use super::{AppSpecializeArgs, HookContext, ServerForkArgs, SpecializeArgs, run_app, run_server_fork};
use crate::log;
use crate::natives::{OriginalMethod, Replacement, TargetMethod};
use crate::runtime::RuntimeHost;
use jni_sys::{JNIEnv, jboolean, jclass, jint, jintArray, jlong, jobjectArray, jstring};
use once_cell::sync::Lazy;

const FORK_AND_SPECIALIZE: &str = "nativeForkAndSpecialize";
const SPECIALIZE_APP_PROCESS: &str = "nativeSpecializeAppProcess";
const FORK_SYSTEM_SERVER: &str = "nativeForkSystemServer";

// 各目标方法唯一的真实原函数
static FORK_AND_SPECIALIZE_ORIG: OriginalMethod = OriginalMethod::new();
static SPECIALIZE_APP_PROCESS_ORIG: OriginalMethod = OriginalMethod::new();
static FORK_SYSTEM_SERVER_ORIG: OriginalMethod = OriginalMethod::new();

const FORK_AND_SPECIALIZE_M_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_AND_SPECIALIZE_O_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_AND_SPECIALIZE_P_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;)I";
const FORK_AND_SPECIALIZE_Q_ALT_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;Z)I";
const FORK_AND_SPECIALIZE_R_SIG: &str = "(II[II[[IILjava/lang/String;Ljava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;Z[Ljava/lang/String;[Ljava/lang/String;ZZ)I";
const FORK_AND_SPECIALIZE_SAMSUNG_M_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_AND_SPECIALIZE_SAMSUNG_N_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[ILjava/lang/String;Ljava/lang/String;I)I";
const FORK_AND_SPECIALIZE_SAMSUNG_O_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[I[ILjava/lang/String;Ljava/lang/String;)I";
const FORK_AND_SPECIALIZE_SAMSUNG_P_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;[I[IZLjava/lang/String;Ljava/lang/String;)I";
const SPECIALIZE_APP_PROCESS_Q_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;ZLjava/lang/String;Ljava/lang/String;)V";
const SPECIALIZE_APP_PROCESS_Q_ALT_SIG: &str =
    "(II[II[[IILjava/lang/String;Ljava/lang/String;ZLjava/lang/String;Ljava/lang/String;Z)V";
const SPECIALIZE_APP_PROCESS_R_SIG: &str = "(II[II[[IILjava/lang/String;Ljava/lang/String;ZLjava/lang/String;Ljava/lang/String;Z[Ljava/lang/String;[Ljava/lang/String;ZZ)V";
const SPECIALIZE_APP_PROCESS_SAMSUNG_Q_SIG: &str =
    "(II[II[[IILjava/lang/String;IILjava/lang/String;ZLjava/lang/String;Ljava/lang/String;)V";
const FORK_SYSTEM_SERVER_SIG: &str = "(II[II[[IJJ)I";
const FORK_SYSTEM_SERVER_SAMSUNG_Q_SIG: &str = "(II[IIII[[IJJ)I";

pub(crate) type ForkAndSpecializeM = unsafe extern "system" fn(
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
    jstring,
    jstring,
) -> jint;

pub(crate) type ForkAndSpecializeO = unsafe extern "system" fn(
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
    jstring,
    jstring,
) -> jint;

pub(crate) type ForkAndSpecializeP = unsafe extern "system" fn(
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

pub(crate) type ForkAndSpecializeQAlt = unsafe extern "system" fn(
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
    jboolean,
) -> jint;

pub(crate) type ForkAndSpecializeR = unsafe extern "system" fn(
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
    jboolean,
    jobjectArray,
    jobjectArray,
    jboolean,
    jboolean,
) -> jint;

// 三星 ROM 在标准参数之间插入的 int 参数语义未公开，只原样转发
pub(crate) type ForkAndSpecializeSamsungM = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jint,
    jstring,
    jint,
    jint,
    jstring,
    jintArray,
    jstring,
    jstring,
) -> jint;

pub(crate) type ForkAndSpecializeSamsungN = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jint,
    jstring,
    jint,
    jint,
    jstring,
    jintArray,
    jstring,
    jstring,
    jint,
) -> jint;

pub(crate) type ForkAndSpecializeSamsungO = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jint,
    jstring,
    jint,
    jint,
    jstring,
    jintArray,
    jintArray,
    jstring,
    jstring,
) -> jint;

pub(crate) type ForkAndSpecializeSamsungP = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jint,
    jstring,
    jint,
    jint,
    jstring,
    jintArray,
    jintArray,
    jboolean,
    jstring,
    jstring,
) -> jint;

pub(crate) type SpecializeAppProcessQ = unsafe extern "system" fn(
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

pub(crate) type SpecializeAppProcessQAlt = unsafe extern "system" fn(
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
    jboolean,
);

pub(crate) type SpecializeAppProcessR = unsafe extern "system" fn(
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
    jboolean,
    jobjectArray,
    jobjectArray,
    jboolean,
    jboolean,
);

pub(crate) type SpecializeAppProcessSamsungQ = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jobjectArray,
    jint,
    jstring,
    jint,
    jint,
    jstring,
    jboolean,
    jstring,
    jstring,
);

pub(crate) type ForkSystemServer = unsafe extern "system" fn(
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

pub(crate) type ForkSystemServerSamsungQ = unsafe extern "system" fn(
    *mut JNIEnv,
    jclass,
    jint,
    jint,
    jintArray,
    jint,
    jint,
    jint,
    jobjectArray,
    jlong,
    jlong,
) -> jint;

static ZYGOTE_TARGETS: Lazy<Vec<TargetMethod>> = Lazy::new(|| {
    vec![
        TargetMethod {
            name: FORK_AND_SPECIALIZE,
            orig: &FORK_AND_SPECIALIZE_ORIG,
            replacements: vec![
                Replacement {
                    signature: FORK_AND_SPECIALIZE_M_SIG,
                    func: fork_and_specialize_m as ForkAndSpecializeM as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_O_SIG,
                    func: fork_and_specialize_o as ForkAndSpecializeO as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_P_SIG,
                    func: fork_and_specialize_p as ForkAndSpecializeP as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_Q_ALT_SIG,
                    func: fork_and_specialize_q_alt as ForkAndSpecializeQAlt as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_R_SIG,
                    func: fork_and_specialize_r as ForkAndSpecializeR as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_SAMSUNG_M_SIG,
                    func: fork_and_specialize_samsung_m as ForkAndSpecializeSamsungM as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_SAMSUNG_N_SIG,
                    func: fork_and_specialize_samsung_n as ForkAndSpecializeSamsungN as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_SAMSUNG_O_SIG,
                    func: fork_and_specialize_samsung_o as ForkAndSpecializeSamsungO as usize,
                },
                Replacement {
                    signature: FORK_AND_SPECIALIZE_SAMSUNG_P_SIG,
                    func: fork_and_specialize_samsung_p as ForkAndSpecializeSamsungP as usize,
                },
            ],
        },
        TargetMethod {
            name: SPECIALIZE_APP_PROCESS,
            orig: &SPECIALIZE_APP_PROCESS_ORIG,
            replacements: vec![
                Replacement {
                    signature: SPECIALIZE_APP_PROCESS_Q_SIG,
                    func: specialize_app_process_q as SpecializeAppProcessQ as usize,
                },
                Replacement {
                    signature: SPECIALIZE_APP_PROCESS_Q_ALT_SIG,
                    func: specialize_app_process_q_alt as SpecializeAppProcessQAlt as usize,
                },
                Replacement {
                    signature: SPECIALIZE_APP_PROCESS_R_SIG,
                    func: specialize_app_process_r as SpecializeAppProcessR as usize,
                },
                Replacement {
                    signature: SPECIALIZE_APP_PROCESS_SAMSUNG_Q_SIG,
                    func: specialize_app_process_samsung_q as SpecializeAppProcessSamsungQ as usize,
                },
            ],
        },
        TargetMethod {
            name: FORK_SYSTEM_SERVER,
            orig: &FORK_SYSTEM_SERVER_ORIG,
            replacements: vec![
                Replacement {
                    signature: FORK_SYSTEM_SERVER_SIG,
                    func: fork_system_server as ForkSystemServer as usize,
                },
                Replacement {
                    signature: FORK_SYSTEM_SERVER_SAMSUNG_Q_SIG,
                    func: fork_system_server_samsung_q as ForkSystemServerSamsungQ as usize,
                },
            ],
        },
    ]
});

// 按优先级排列的替换目标
pub(crate) fn zygote_targets() -> &'static [TargetMethod] {
    &ZYGOTE_TARGETS
}

fn missing_original(name: &str) {
    log::error(format_args!("hook: original {name} is not saved"));
}

unsafe fn fork_and_specialize<F>(env: *mut JNIEnv, args: AppSpecializeArgs, forward: F) -> jint
where
    F: FnOnce() -> jint,
{
    let mut ctx = HookContext::new(SpecializeArgs::App(args));
    let mut host = RuntimeHost::new(env);
    run_app(&mut ctx, &mut host, true, forward)
}

unsafe fn specialize_app_process<F>(env: *mut JNIEnv, args: AppSpecializeArgs, forward: F)
where
    F: FnOnce(),
{
    let mut ctx = HookContext::new(SpecializeArgs::App(args));
    let mut host = RuntimeHost::new(env);
    run_app(&mut ctx, &mut host, false, forward)
}

unsafe extern "system" fn fork_and_specialize_m(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    fds_to_close: jintArray,
    instruction_set: jstring,
    app_data_dir: jstring,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeM>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                fds_to_close,
                instruction_set,
                app_data_dir,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_o(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    fds_to_close: jintArray,
    fds_to_ignore: jintArray,
    instruction_set: jstring,
    app_data_dir: jstring,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeO>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                fds_to_close,
                fds_to_ignore,
                instruction_set,
                app_data_dir,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_p(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    fds_to_close: jintArray,
    fds_to_ignore: jintArray,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeP>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                fds_to_close,
                fds_to_ignore,
                is_child_zygote,
                instruction_set,
                app_data_dir,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_q_alt(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    fds_to_close: jintArray,
    fds_to_ignore: jintArray,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
    is_top_app: jboolean,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        is_top_app: Some(is_top_app),
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeQAlt>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                fds_to_close,
                fds_to_ignore,
                is_child_zygote,
                instruction_set,
                app_data_dir,
                is_top_app,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_r(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    fds_to_close: jintArray,
    fds_to_ignore: jintArray,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
    is_top_app: jboolean,
    pkg_data_info_list: jobjectArray,
    whitelisted_data_info_list: jobjectArray,
    mount_data_dirs: jboolean,
    mount_storage_dirs: jboolean,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        is_top_app: Some(is_top_app),
        pkg_data_info_list: Some(pkg_data_info_list),
        whitelisted_data_info_list: Some(whitelisted_data_info_list),
        mount_data_dirs: Some(mount_data_dirs),
        mount_storage_dirs: Some(mount_storage_dirs),
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeR>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                fds_to_close,
                fds_to_ignore,
                is_child_zygote,
                instruction_set,
                app_data_dir,
                is_top_app,
                pkg_data_info_list,
                whitelisted_data_info_list,
                mount_data_dirs,
                mount_storage_dirs,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_samsung_m(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    vendor_arg1: jint,
    vendor_arg2: jint,
    nice_name: jstring,
    fds_to_close: jintArray,
    instruction_set: jstring,
    app_data_dir: jstring,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeSamsungM>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                vendor_arg1,
                vendor_arg2,
                nice_name,
                fds_to_close,
                instruction_set,
                app_data_dir,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_samsung_n(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    vendor_arg1: jint,
    vendor_arg2: jint,
    nice_name: jstring,
    fds_to_close: jintArray,
    instruction_set: jstring,
    app_data_dir: jstring,
    vendor_arg3: jint,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeSamsungN>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                vendor_arg1,
                vendor_arg2,
                nice_name,
                fds_to_close,
                instruction_set,
                app_data_dir,
                vendor_arg3,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_samsung_o(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    vendor_arg1: jint,
    vendor_arg2: jint,
    nice_name: jstring,
    fds_to_close: jintArray,
    fds_to_ignore: jintArray,
    instruction_set: jstring,
    app_data_dir: jstring,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeSamsungO>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                vendor_arg1,
                vendor_arg2,
                nice_name,
                fds_to_close,
                fds_to_ignore,
                instruction_set,
                app_data_dir,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_and_specialize_samsung_p(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    vendor_arg1: jint,
    vendor_arg2: jint,
    nice_name: jstring,
    fds_to_close: jintArray,
    fds_to_ignore: jintArray,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
) -> jint {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        ..AppSpecializeArgs::default()
    };
    fork_and_specialize(env, args, || {
        match FORK_AND_SPECIALIZE_ORIG.load_as::<ForkAndSpecializeSamsungP>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                vendor_arg1,
                vendor_arg2,
                nice_name,
                fds_to_close,
                fds_to_ignore,
                is_child_zygote,
                instruction_set,
                app_data_dir,
            ),
            None => {
                missing_original(FORK_AND_SPECIALIZE);
                -1
            }
        }
    })
}

unsafe extern "system" fn specialize_app_process_q(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
) {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        ..AppSpecializeArgs::default()
    };
    specialize_app_process(env, args, || {
        match SPECIALIZE_APP_PROCESS_ORIG.load_as::<SpecializeAppProcessQ>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                is_child_zygote,
                instruction_set,
                app_data_dir,
            ),
            None => missing_original(SPECIALIZE_APP_PROCESS),
        }
    })
}

unsafe extern "system" fn specialize_app_process_q_alt(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
    is_top_app: jboolean,
) {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        is_top_app: Some(is_top_app),
        ..AppSpecializeArgs::default()
    };
    specialize_app_process(env, args, || {
        match SPECIALIZE_APP_PROCESS_ORIG.load_as::<SpecializeAppProcessQAlt>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                is_child_zygote,
                instruction_set,
                app_data_dir,
                is_top_app,
            ),
            None => missing_original(SPECIALIZE_APP_PROCESS),
        }
    })
}

unsafe extern "system" fn specialize_app_process_r(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    nice_name: jstring,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
    is_top_app: jboolean,
    pkg_data_info_list: jobjectArray,
    whitelisted_data_info_list: jobjectArray,
    mount_data_dirs: jboolean,
    mount_storage_dirs: jboolean,
) {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        is_top_app: Some(is_top_app),
        pkg_data_info_list: Some(pkg_data_info_list),
        whitelisted_data_info_list: Some(whitelisted_data_info_list),
        mount_data_dirs: Some(mount_data_dirs),
        mount_storage_dirs: Some(mount_storage_dirs),
    };
    specialize_app_process(env, args, || {
        match SPECIALIZE_APP_PROCESS_ORIG.load_as::<SpecializeAppProcessR>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                nice_name,
                is_child_zygote,
                instruction_set,
                app_data_dir,
                is_top_app,
                pkg_data_info_list,
                whitelisted_data_info_list,
                mount_data_dirs,
                mount_storage_dirs,
            ),
            None => missing_original(SPECIALIZE_APP_PROCESS),
        }
    })
}

unsafe extern "system" fn specialize_app_process_samsung_q(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    mount_external: jint,
    se_info: jstring,
    vendor_arg1: jint,
    vendor_arg2: jint,
    nice_name: jstring,
    is_child_zygote: jboolean,
    instruction_set: jstring,
    app_data_dir: jstring,
) {
    let args = AppSpecializeArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        mount_external,
        se_info,
        nice_name,
        instruction_set,
        app_data_dir,
        is_child_zygote: Some(is_child_zygote),
        ..AppSpecializeArgs::default()
    };
    specialize_app_process(env, args, || {
        match SPECIALIZE_APP_PROCESS_ORIG.load_as::<SpecializeAppProcessSamsungQ>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                mount_external,
                se_info,
                vendor_arg1,
                vendor_arg2,
                nice_name,
                is_child_zygote,
                instruction_set,
                app_data_dir,
            ),
            None => missing_original(SPECIALIZE_APP_PROCESS),
        }
    })
}

unsafe extern "system" fn fork_system_server(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    rlimits: jobjectArray,
    permitted_capabilities: jlong,
    effective_capabilities: jlong,
) -> jint {
    let args = ServerForkArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        permitted_capabilities,
        effective_capabilities,
    };
    let mut ctx = HookContext::new(SpecializeArgs::Server(args));
    let mut host = RuntimeHost::new(env);
    run_server_fork(&mut ctx, &mut host, || {
        match FORK_SYSTEM_SERVER_ORIG.load_as::<ForkSystemServer>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                rlimits,
                permitted_capabilities,
                effective_capabilities,
            ),
            None => {
                missing_original(FORK_SYSTEM_SERVER);
                -1
            }
        }
    })
}

unsafe extern "system" fn fork_system_server_samsung_q(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: jint,
    gid: jint,
    gids: jintArray,
    runtime_flags: jint,
    vendor_arg1: jint,
    vendor_arg2: jint,
    rlimits: jobjectArray,
    permitted_capabilities: jlong,
    effective_capabilities: jlong,
) -> jint {
    let args = ServerForkArgs {
        uid,
        gid,
        gids,
        runtime_flags,
        rlimits,
        permitted_capabilities,
        effective_capabilities,
    };
    let mut ctx = HookContext::new(SpecializeArgs::Server(args));
    let mut host = RuntimeHost::new(env);
    run_server_fork(&mut ctx, &mut host, || {
        match FORK_SYSTEM_SERVER_ORIG.load_as::<ForkSystemServerSamsungQ>() {
            Some(orig) => orig(
                env,
                clazz,
                uid,
                gid,
                gids,
                runtime_flags,
                vendor_arg1,
                vendor_arg2,
                rlimits,
                permitted_capabilities,
                effective_capabilities,
            ),
            None => {
                missing_original(FORK_SYSTEM_SERVER);
                -1
            }
        }
    })
}
