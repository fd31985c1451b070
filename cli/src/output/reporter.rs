//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// With a spinner, `step()` updates the spinner line; without one it prints
/// `"  → {message}"`. Everything is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx, spinner: None }
    }

    /// Like `new`, but drives a spinner when the terminal can show one.
    #[must_use]
    pub fn with_spinner(ctx: &'a OutputContext, msg: &str) -> Self {
        let spinner = ctx.show_progress().then(|| progress::spinner(msg));
        Self { ctx, spinner }
    }

    /// Close the spinner with a final verdict line.
    pub fn finish(&self, ok: bool, msg: &str) {
        match &self.spinner {
            Some(pb) if ok => progress::finish_ok(pb, msg),
            Some(pb) => progress::finish_error(pb, msg),
            None if ok => self.ctx.success(msg),
            None => self.ctx.warn(msg),
        }
    }

    /// Remove the spinner line, leaving the verdict to the caller.
    pub fn clear(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if let Some(pb) = &self.spinner {
            pb.set_message(message.to_string());
        } else if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }

    fn success(&self, message: &str) {
        if let Some(pb) = &self.spinner {
            pb.println(format!("  ✓ {message}"));
        } else {
            self.ctx.success(message);
        }
    }

    fn warn(&self, message: &str) {
        if let Some(pb) = &self.spinner {
            pb.println(format!("  ⚠ {message}"));
        } else {
            self.ctx.warn(message);
        }
    }
}
