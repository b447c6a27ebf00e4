use super::{ForkPhase, HookContext, Published, SpecializeArgs};
use crate::log;
use jni_sys::jint;
use libc::pid_t;

// 状态机依赖的宿主能力，运行时实现对接真实进程，测试中替换为记录器
pub(crate) trait SpecializeHost {
    // 真实的 fork，不经过 fork 符号 hook
    fn fork(&mut self) -> pid_t;
    fn block_sigchld(&mut self, block: bool);
    fn process_name(&mut self, args: &SpecializeArgs) -> Option<String>;
    fn should_hide(&mut self, uid: jint, process_name: &str) -> bool;
    // 若 JNIEnv 仍指向替换表则恢复，并释放类名缓存
    fn restore_env_table(&mut self);
    fn self_unload(&mut self);
    fn publish(&mut self, published: Option<Published>);
}

// 应用特化：fork 为 true 时是 nativeForkAndSpecialize，否则是 nativeSpecializeAppProcess
pub(crate) fn run_app<H, R, F>(ctx: &mut HookContext, host: &mut H, fork: bool, forward: F) -> R
where
    H: SpecializeHost + ?Sized,
    F: FnOnce() -> R,
{
    pre_fork(ctx, host, fork);
    if !ctx.is_parent() {
        decide_hide(ctx, host);
        ctx.phase = ForkPhase::ChildContinuing;
        host.publish(Some(ctx.published()));
    }

    // 父进程中原方法内部的 fork 由 fork 符号 hook 直接返回已有 pid
    let result = forward();

    if !post_fork(ctx, host, fork) {
        return result;
    }
    log::debug(format_args!("hook: specialize post {:?}", ctx.phase));
    if ctx.do_hide {
        host.self_unload();
    }
    ctx.phase = ForkPhase::Idle;
    result
}

// system_server：fork 前恢复 JNIEnv 函数表，不做隐藏判定
pub(crate) fn run_server_fork<H, R, F>(ctx: &mut HookContext, host: &mut H, forward: F) -> R
where
    H: SpecializeHost + ?Sized,
    F: FnOnce() -> R,
{
    host.restore_env_table();
    pre_fork(ctx, host, true);
    log::debug(format_args!("hook: nativeForkSystemServer pre"));
    if !ctx.is_parent() {
        ctx.phase = ForkPhase::ChildContinuing;
    }

    let result = forward();

    if post_fork(ctx, host, true) {
        log::debug(format_args!("hook: nativeForkSystemServer post {:?}", ctx.phase));
        ctx.phase = ForkPhase::Idle;
    }
    result
}

fn pre_fork<H>(ctx: &mut HookContext, host: &mut H, fork: bool)
where
    H: SpecializeHost + ?Sized,
{
    ctx.phase = ForkPhase::PreFork;
    host.publish(Some(ctx.published()));
    if !fork {
        return;
    }
    // 先阻塞 SIGCHLD，post 阶段再解除
    host.block_sigchld(true);
    ctx.pid = host.fork();
    host.publish(Some(ctx.published()));
    if ctx.is_parent() {
        ctx.phase = ForkPhase::ParentDone;
    }
}

// 返回 false 表示当前在父进程，post 阶段到此为止
fn post_fork<H>(ctx: &mut HookContext, host: &mut H, fork: bool) -> bool
where
    H: SpecializeHost + ?Sized,
{
    host.publish(None);
    if fork {
        host.block_sigchld(false);
    }
    if ctx.is_parent() {
        return false;
    }
    ctx.phase = ForkPhase::PostFork;
    true
}

fn decide_hide<H>(ctx: &mut HookContext, host: &mut H)
where
    H: SpecializeHost + ?Sized,
{
    let SpecializeArgs::App(args) = &ctx.args else {
        return;
    };
    let uid = args.uid;
    let eligible = args.hide_eligible();
    let process = host.process_name(&ctx.args);
    let name = process.as_deref().unwrap_or("");
    log::debug(format_args!("hook: specialize pre {name}"));

    if eligible && host.should_hide(uid, name) {
        ctx.do_hide = true;
        log::info(format_args!("hook: [{name}] should be hidden"));
    }
}
