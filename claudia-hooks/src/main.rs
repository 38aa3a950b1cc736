use std::env;
use std::io::Write;

use claudia_hooks::cli::router;
use claudia_hooks::hooks::types::HookEnv;

#[cfg(not(tarpaulin_include))]
fn main() {
    let args: Vec<String> = env::args().collect();
    let hook_env = HookEnv::from_process();

    match router::run_cli(args, &hook_env) {
        Ok(output) => {
            if !output.stdout.is_empty() {
                println!("{}", output.stdout.trim_end());
            }
            if !output.stderr.is_empty() {
                eprint!("{}", output.stderr);
                let _ = std::io::stderr().flush();
            }
            if output.exit_code != 0 {
                std::process::exit(output.exit_code);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
