//! Window selection through the X window-introspection tool.
//!
//! Every mode runs `xwininfo` (or a substitute program) once and pulls the
//! window id out of the first line shaped like
//! `xwininfo: Window id: 0x1a00007 "title"`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::errors::{Result, XshotError};
use crate::process::ProcessRunner;

pub const DEFAULT_SELECT_TOOL: &str = "xwininfo";
pub const DEFAULT_LOG_TARGET: &str = "xshot::window";

static WINDOW_ID_RE: OnceLock<Regex> = OnceLock::new();

fn window_id_re() -> &'static Regex {
    WINDOW_ID_RE.get_or_init(|| {
        Regex::new(r"(?m)^xwininfo: Window id: (?P<window>0x[0-9A-Za-z]+) .*")
            .expect("window id pattern is valid")
    })
}

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Window identifier as printed by the introspection tool, e.g. `0x1a00007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WindowHandle(String);

impl WindowHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the window to capture is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Let the user click a window.
    Interactive,
    /// Confirm a window by numeric id.
    Id(u64),
    /// Look a window up by name.
    Name(String),
    /// The root window.
    Root,
}

impl SelectionMode {
    /// Arguments passed to the introspection tool for this mode.
    pub fn args(&self) -> Vec<String> {
        match self {
            SelectionMode::Interactive => Vec::new(),
            SelectionMode::Id(id) => vec!["-id".to_owned(), format!("0x{id:x}")],
            SelectionMode::Name(name) => vec!["-name".to_owned(), name.clone()],
            SelectionMode::Root => vec!["-root".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a window id given as hex (`0x1a`), octal (`0o32`) or decimal (`26`).
///
/// Surrounding whitespace and prefix case are ignored.
pub fn parse_window_id(value: &str) -> Result<u64> {
    let folded = value.trim().to_ascii_lowercase();
    let parsed = if let Some(hex) = folded.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else if let Some(oct) = folded.strip_prefix("0o") {
        u64::from_str_radix(oct, 8)
    } else {
        folded.parse::<u64>()
    };
    parsed.map_err(|e| XshotError::InvalidValue {
        field: "window_id",
        value: format!("{value:?} ({e})"),
    })
}

/// Extract the window handle from introspection tool output.
pub fn parse_window_reply(stdout: &str) -> Option<WindowHandle> {
    window_id_re()
        .captures(stdout)
        .and_then(|caps| caps.name("window"))
        .map(|m| WindowHandle(m.as_str().to_owned()))
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Obtains a [`WindowHandle`] by running the introspection tool.
#[derive(Debug, Clone)]
pub struct WindowSelector<'a> {
    runner: &'a ProcessRunner,
    program: String,
    log_target: String,
}

impl<'a> WindowSelector<'a> {
    pub fn new(runner: &'a ProcessRunner) -> Self {
        Self {
            runner,
            program: DEFAULT_SELECT_TOOL.to_owned(),
            log_target: DEFAULT_LOG_TARGET.to_owned(),
        }
    }

    /// Use `program` instead of `xwininfo`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Route this selector's log records to `target`.
    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    pub fn log_target(&self) -> &str {
        &self.log_target
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the tool for `mode` and parse its reply.
    ///
    /// A non-zero exit propagates as `CommandFailed`; output without a window
    /// id is `WindowNotFound`.
    pub fn select(&self, mode: &SelectionMode) -> Result<WindowHandle> {
        let args = mode.args();
        let output = self.runner.run(&self.program, args.as_slice())?;
        match parse_window_reply(&output.stdout) {
            Some(handle) => {
                log::debug!(
                    target: self.log_target.as_str(),
                    "selected window {handle} ({mode:?})"
                );
                Ok(handle)
            }
            None => {
                log::error!(
                    target: self.log_target.as_str(),
                    "{} - no window id in output",
                    self.program
                );
                Err(XshotError::WindowNotFound(format!(
                    "no window id in {} output ({mode:?})",
                    self.program
                )))
            }
        }
    }

    /// Block until the user picks a window.
    pub fn fetch_window(&self) -> Result<WindowHandle> {
        self.select(&SelectionMode::Interactive)
    }

    pub fn window_root(&self) -> Result<WindowHandle> {
        self.select(&SelectionMode::Root)
    }

    pub fn window_by_id(&self, id: u64) -> Result<WindowHandle> {
        self.select(&SelectionMode::Id(id))
    }

    pub fn window_by_name(&self, name: &str) -> Result<WindowHandle> {
        self.select(&SelectionMode::Name(name.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
