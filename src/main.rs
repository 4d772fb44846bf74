//! Blueprint Studio
//!
//! Project state and canvas synchronization engine for visual backend design.
//!
//! This binary is the same command-line front end as `blueprint`, installed
//! under the workspace's package name.

use std::process::ExitCode;

fn main() -> ExitCode {
    blueprint_cli::main_entry()
}
