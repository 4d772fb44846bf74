//! `blueprint` command-line tool

use std::process::ExitCode;

fn main() -> ExitCode {
    blueprint_cli::main_entry()
}
