#![allow(unsafe_op_in_unsafe_fn)]

mod scenarios;
mod sim_ctx;
mod sim_jni;

use zygote_hook::set_debug_enabled;

fn main() {
    set_debug_enabled(sim_ctx::env_flag("ZYGOTE_SIM_DEBUG"));
    println!("zygote_sim {}", zygote_hook::get_version());
    unsafe {
        scenarios::run_all();
    }
    println!("zygote_sim all scenarios passed");
}
