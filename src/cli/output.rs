//! Terminal messages of the `sas` binary
//!
//! Engine output (listing, data grids, log) is printed uncolored by the
//! services. Only the CLI's own messages go through here. `colored` honours
//! NO_COLOR, CLICOLOR and CLICOLOR_FORCE.

use std::fmt::Display;
use std::path::Path;

use colored::{ColoredString, Colorize};

/// `error: <msg>` on stderr
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}", labelled("error".red().bold(), msg));
}

/// `warning: <msg>` on stderr
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}", labelled("warning".yellow().bold(), msg));
}

/// Effective settings or other plain text, without a trailing blank line.
pub fn plain(text: &str) {
    println!("{}", text.trim_end());
}

/// Location of the config file and whether it is there yet.
pub fn config_location(path: &Path, exists: bool) {
    let state = if exists {
        "exists".green()
    } else {
        "not created".yellow()
    };
    println!("{} ({})", path.display(), state);
}

/// Confirmation after writing a file.
pub fn created(path: &Path) {
    println!("{}", labelled("Created".green(), &path.display()));
}

fn labelled(label: ColoredString, msg: &(impl Display + ?Sized)) -> String {
    format!("{label}: {msg}")
}
