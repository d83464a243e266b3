//! `plashboard` CLI binary.
//!
//! This is the minimal entrypoint. All logic lives in the library; `main`
//! only invokes `cli::run()` and maps its result to a process exit code.

fn main() {
    if let Err(code) = plashboard::cli::run() {
        std::process::exit(code.as_i32());
    }
}
