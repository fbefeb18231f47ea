//! `xshot_core` -- filename numbering and external tool orchestration for
//! the `xshot` screenshot tool.
//!
//! Pixels never pass through this crate.  It decides where a screenshot goes
//! and drives the X11 tools that take it:
//! - `xwininfo` to pick or confirm a window
//! - ImageMagick `import` to write the image
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | `XshotError` enum via `thiserror` |
//! | [`settings`] | `Setting<T>` fields and `NamingSettings` |
//! | [`validate`] | Directory, date format and template checks |
//! | [`template`] | `{number}` / `{datetime}` basename templates |
//! | [`namer`] | `FileNamer`: next free filename or explicit path |
//! | [`process`] | `ProcessRunner`: run a child, drain both pipes, classify exit |
//! | [`window`] | `WindowSelector` over `xwininfo` |
//! | [`capture`] | `CaptureInvoker` over `import` |

pub mod capture;
pub mod errors;
pub mod namer;
pub mod process;
pub mod settings;
pub mod template;
pub mod validate;
pub mod window;

pub use capture::{CaptureInvoker, CaptureRequest};
pub use errors::{Result, XshotError};
pub use namer::FileNamer;
pub use process::{ExitKind, ProcessOutput, ProcessRunner};
pub use settings::{ImageFormat, NamingSettings, Setting};
pub use window::{SelectionMode, WindowHandle, WindowSelector};
