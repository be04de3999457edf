// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Terminal report markers
//!
//! Consistent markers for the lines of a CLI report.

use colored::Colorize;

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print a warning
pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print a warning to stderr, for commands whose stdout is a document
pub fn eprint_warning(msg: &str) {
    eprintln!("  {} {}", "⚠".yellow(), msg);
}
