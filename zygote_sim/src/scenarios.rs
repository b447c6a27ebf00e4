mod bridge;
mod helper;

// bridge 场景依次执行，共享同一次安装
pub unsafe fn run_all() {
    run("bridge-install", bridge::scenario_install_through_set_argv0);
    run("bridge-vm-created", bridge::scenario_vm_created_swaps_env_table);
    run("bridge-register-natives", bridge::scenario_register_natives_through_env);
    run("bridge-fork-parent", bridge::scenario_fork_parent);
    run("bridge-fork-child-visible", bridge::scenario_fork_child_visible);
    run("bridge-fork-child-mount-none", bridge::scenario_fork_child_mount_none);
    run("bridge-fork-child-hidden", bridge::scenario_fork_child_hidden_unloads);
    run("bridge-teardown-after-unload", bridge::scenario_teardown_after_unload);
    run("helper-cycle", helper::scenario_helper_cycle);
    run("helper-restore-failure", helper::scenario_restore_failure_retry);
}

fn run(name: &str, scenario: unsafe fn()) {
    println!("scenario: {name}");
    unsafe {
        scenario();
    }
}
