//! Progress reporting for long-running commands
//!
//! - TTY mode: animated progress bar on stderr
//! - Non-TTY, robot and quiet modes: hidden bar; tracing carries the summary

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress output mode based on terminal capabilities and user preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Tty,
    NonTty,
    Robot,
    Quiet,
}

impl ProgressMode {
    #[must_use]
    pub fn detect(robot_mode: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if robot_mode {
            Self::Robot
        } else if std::io::stderr().is_terminal() {
            Self::Tty
        } else {
            Self::NonTty
        }
    }

    #[must_use]
    pub const fn is_animated(self) -> bool {
        matches!(self, Self::Tty)
    }
}

/// Bar for a determinate operation; hidden unless animated.
#[must_use]
pub fn progress_bar(mode: ProgressMode, len: u64, operation: &str) -> ProgressBar {
    if !mode.is_animated() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_prefix(operation.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_robot() {
        assert_eq!(ProgressMode::detect(true, true), ProgressMode::Quiet);
        assert_eq!(ProgressMode::detect(true, false), ProgressMode::Robot);
    }

    #[test]
    fn non_animated_modes_hide_the_bar() {
        assert!(progress_bar(ProgressMode::Robot, 10, "Indexing").is_hidden());
        assert!(progress_bar(ProgressMode::NonTty, 10, "Indexing").is_hidden());
    }
}
