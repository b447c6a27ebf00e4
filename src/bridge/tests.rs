use super::*;
use crate::jni_env::JniEnv;
use jni_sys::{JNIEnv, JNINativeInterface_, JNINativeMethod, jclass, jint};
use std::ffi::{c_int, c_void};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

static ORIGINAL_VM_CREATED: AtomicUsize = AtomicUsize::new(0);
static TRAMPOLINE_VM_CREATED: AtomicUsize = AtomicUsize::new(0);
static ON_EXIT_CODES: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn original_on_vm_created(_this: *mut c_void, _env: *mut JNIEnv) {
    ORIGINAL_VM_CREATED.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn trampoline_on_vm_created(_this: *mut c_void, _env: *mut JNIEnv) {
    TRAMPOLINE_VM_CREATED.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn on_started(_this: *mut c_void) {}

unsafe extern "C" fn on_exit(_this: *mut c_void, code: c_int) {
    ON_EXIT_CODES.fetch_add(code as usize, Ordering::SeqCst);
}

#[repr(C)]
struct FakeRuntime {
    vptr: *const RuntimeVtable,
    marker: u64,
}

fn runtime_vtable() -> RuntimeVtable {
    RuntimeVtable {
        rtti: 0x1234 as *const c_void,
        dtor: ptr::null(),
        on_vm_created: Some(original_on_vm_created),
        on_started: Some(on_started),
        on_zygote_init: None,
        on_exit: Some(on_exit),
    }
}

#[test]
fn vtable_override_swaps_only_vm_created_slot() {
    let table = runtime_vtable();
    let mut runtime = FakeRuntime {
        vptr: &table,
        marker: 7,
    };
    let object = &mut runtime as *mut FakeRuntime as *mut c_void;

    let (guard, previous) = unsafe { VtableOverride::acquire(object, trampoline_on_vm_created) }
        .expect("acquire on a live object");
    assert!(guard.is_active());
    assert_eq!(guard.original(), &table as *const RuntimeVtable);
    assert!(!ptr::eq(runtime.vptr, &table));

    let active = unsafe { &*runtime.vptr };
    assert_eq!(active.rtti, table.rtti);
    assert_eq!(
        active.on_started.map(|f| f as usize),
        table.on_started.map(|f| f as usize)
    );
    assert_eq!(active.on_exit.map(|f| f as usize), Some(on_exit as usize));

    let before = TRAMPOLINE_VM_CREATED.load(Ordering::SeqCst);
    unsafe { (active.on_vm_created.expect("slot populated"))(object, ptr::null_mut()) };
    assert_eq!(TRAMPOLINE_VM_CREATED.load(Ordering::SeqCst), before + 1);

    // trampoline 转发原处理函数
    let original_before = ORIGINAL_VM_CREATED.load(Ordering::SeqCst);
    unsafe { (previous.expect("original handler"))(object, ptr::null_mut()) };
    assert_eq!(ORIGINAL_VM_CREATED.load(Ordering::SeqCst), original_before + 1);

    guard.release();
    assert!(ptr::eq(runtime.vptr, &table));
    assert_eq!(runtime.marker, 7);
}

#[test]
fn vtable_override_rejects_null_object() {
    let result = unsafe { VtableOverride::acquire(ptr::null_mut(), trampoline_on_vm_created) };
    assert!(result.is_none());

    let mut runtime = FakeRuntime {
        vptr: ptr::null(),
        marker: 0,
    };
    let object = &mut runtime as *mut FakeRuntime as *mut c_void;
    let result = unsafe { VtableOverride::acquire(object, trampoline_on_vm_created) };
    assert!(result.is_none());
    assert!(runtime.vptr.is_null());
}

#[test]
fn vtable_release_leaves_foreign_vptr_untouched() {
    let table = runtime_vtable();
    let other = runtime_vtable();
    let mut runtime = FakeRuntime {
        vptr: &table,
        marker: 0,
    };
    let object = &mut runtime as *mut FakeRuntime as *mut c_void;
    let (guard, _) = unsafe { VtableOverride::acquire(object, trampoline_on_vm_created) }
        .expect("acquire on a live object");

    // 期间有人再次改写了 vptr
    runtime.vptr = &other;
    assert!(!guard.is_active());
    guard.release();
    assert!(ptr::eq(runtime.vptr, &other));
}

static FAKE_REGISTER_CALLS: AtomicUsize = AtomicUsize::new(0);
static HOOK_REGISTER_CALLS: AtomicUsize = AtomicUsize::new(0);

unsafe extern "system" fn fake_register_natives(
    _env: *mut JNIEnv,
    _clazz: jclass,
    _methods: *const JNINativeMethod,
    _count: jint,
) -> jint {
    FAKE_REGISTER_CALLS.fetch_add(1, Ordering::SeqCst);
    0
}

unsafe extern "system" fn hook_register_natives(
    _env: *mut JNIEnv,
    _clazz: jclass,
    _methods: *const JNINativeMethod,
    _count: jint,
) -> jint {
    HOOK_REGISTER_CALLS.fetch_add(1, Ordering::SeqCst);
    0
}

unsafe extern "system" fn fake_get_version(_env: *mut JNIEnv) -> jint {
    0x0001_0006
}

fn fake_interface() -> JNINativeInterface_ {
    let mut table: JNINativeInterface_ = unsafe { std::mem::zeroed() };
    table.GetVersion = Some(fake_get_version);
    table.RegisterNatives = Some(fake_register_natives);
    table
}

#[test]
fn jni_table_override_replaces_register_natives() {
    let table = fake_interface();
    let mut raw_env: JNIEnv = &table;
    let env = unsafe { JniEnv::from_raw(&mut raw_env) }.expect("fake env");

    let guard = unsafe { JniTableOverride::install(&env, hook_register_natives) }
        .expect("install on a live env");
    assert!(guard.is_active_on(&env));
    assert_eq!(guard.original(), &table as *const JNINativeInterface_);
    assert_eq!(
        guard.original_register_natives().map(|f| f as usize),
        Some(fake_register_natives as usize)
    );

    let before = HOOK_REGISTER_CALLS.load(Ordering::SeqCst);
    let fake_before = FAKE_REGISTER_CALLS.load(Ordering::SeqCst);
    assert_eq!(env.register_natives(ptr::null_mut(), ptr::null(), 0), Some(0));
    assert_eq!(HOOK_REGISTER_CALLS.load(Ordering::SeqCst), before + 1);
    assert_eq!(FAKE_REGISTER_CALLS.load(Ordering::SeqCst), fake_before);

    // 其余槽位保持原值
    let active = unsafe { &*env.functions() };
    assert_eq!(
        active.GetVersion.map(|f| f as usize),
        Some(fake_get_version as usize)
    );

    unsafe { guard.restore(&env) };
    assert!(ptr::eq(env.functions(), &table));
    assert_eq!(env.register_natives(ptr::null_mut(), ptr::null(), 0), Some(0));
    assert_eq!(FAKE_REGISTER_CALLS.load(Ordering::SeqCst), fake_before + 1);
}

#[test]
fn jni_table_restore_skips_foreign_table() {
    let table = fake_interface();
    let foreign = fake_interface();
    let mut raw_env: JNIEnv = &table;
    let env = unsafe { JniEnv::from_raw(&mut raw_env) }.expect("fake env");

    let guard = unsafe { JniTableOverride::install(&env, hook_register_natives) }
        .expect("install on a live env");
    unsafe { env.set_functions(&foreign) };
    assert!(!guard.is_active_on(&env));
    unsafe { guard.restore(&env) };
    assert!(ptr::eq(env.functions(), &foreign));
}
