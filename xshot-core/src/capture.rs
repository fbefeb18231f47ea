//! Capture command construction and invocation.
//!
//! The capture tool is ImageMagick's `import`, called as
//! `import [-window <id> [-frame]] <dest>`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::process::ProcessRunner;
use crate::window::WindowHandle;

pub const DEFAULT_CAPTURE_TOOL: &str = "import";

/// One capture, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    destination: PathBuf,
    window: Option<WindowHandle>,
    include_decorations: bool,
}

impl CaptureRequest {
    pub fn new(
        destination: impl Into<PathBuf>,
        window: Option<WindowHandle>,
        include_decorations: bool,
    ) -> Self {
        Self {
            destination: destination.into(),
            window,
            include_decorations,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn window(&self) -> Option<&WindowHandle> {
        self.window.as_ref()
    }

    pub fn include_decorations(&self) -> bool {
        self.include_decorations
    }

    /// Capture tool arguments.  The destination is always last; `-frame` is
    /// only emitted together with `-window`.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(4);
        if let Some(window) = &self.window {
            args.push(OsString::from("-window"));
            args.push(OsString::from(window.as_str()));
            if self.include_decorations {
                args.push(OsString::from("-frame"));
            }
        }
        args.push(self.destination.clone().into_os_string());
        args
    }
}

/// Runs the capture tool.
#[derive(Debug, Clone)]
pub struct CaptureInvoker<'a> {
    runner: &'a ProcessRunner,
    program: String,
}

impl<'a> CaptureInvoker<'a> {
    pub fn new(runner: &'a ProcessRunner) -> Self {
        Self {
            runner,
            program: DEFAULT_CAPTURE_TOOL.to_owned(),
        }
    }

    /// Use `program` instead of `import`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Capture to `destination`, the whole screen when `window` is `None`.
    pub fn capture(
        &self,
        destination: &Path,
        window: Option<&WindowHandle>,
        include_decorations: bool,
    ) -> Result<()> {
        self.invoke(&CaptureRequest::new(
            destination,
            window.cloned(),
            include_decorations,
        ))
    }

    /// Run the capture tool for `request`.  Failures propagate unchanged.
    pub fn invoke(&self, request: &CaptureRequest) -> Result<()> {
        let args = request.args();
        self.runner.run(&self.program, args.as_slice())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::parse_window_reply;

    fn handle() -> WindowHandle {
        parse_window_reply("xwininfo: Window id: 0x1a \"term\"\n").unwrap()
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_full_screen_never_has_frame() {
        let req = CaptureRequest::new("/tmp/out.png", None, true);
        assert_eq!(strings(req.args()), vec!["/tmp/out.png"]);
        let req = CaptureRequest::new("/tmp/out.png", None, false);
        assert_eq!(strings(req.args()), vec!["/tmp/out.png"]);
    }

    #[test]
    fn test_window_with_frame() {
        let req = CaptureRequest::new("/tmp/out.png", Some(handle()), true);
        assert_eq!(
            strings(req.args()),
            vec!["-window", "0x1a", "-frame", "/tmp/out.png"]
        );
    }

    #[test]
    fn test_window_without_frame() {
        let req = CaptureRequest::new("/tmp/out.png", Some(handle()), false);
        assert_eq!(strings(req.args()), vec!["-window", "0x1a", "/tmp/out.png"]);
        assert!(!req.include_decorations());
        assert_eq!(req.window(), Some(&handle()));
        assert_eq!(req.destination(), Path::new("/tmp/out.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_propagates_failure() {
        let runner = ProcessRunner::new();
        let invoker = CaptureInvoker::new(&runner).with_program("false");
        let err = invoker
            .capture(Path::new("/tmp/never.png"), None, false)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::errors::XshotError::CommandFailed {
                status: crate::process::ExitKind::Exited(1),
                ..
            }
        ));
    }
}
