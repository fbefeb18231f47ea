//! Argument-level validation shared by the settings and the CLI.
//!
//! These return the specific error kind (`InvalidDirectory`,
//! `InvalidDateFormat`, ...).  Settings collapse a failure into
//! `InvalidValue` for the field being written.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};

use crate::errors::{Result, XshotError};
use crate::template::NameTemplate;

/// Check that `path` exists, is a directory, and can be listed and entered.
pub fn directory(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(XshotError::InvalidDirectory(format!(
            "{:?} does not exist",
            path.display().to_string()
        )));
    }
    if !path.is_dir() {
        return Err(XshotError::InvalidDirectory(format!(
            "{:?} is not a directory",
            path.display().to_string()
        )));
    }
    if !is_traversable(path) {
        return Err(XshotError::InvalidDirectory(format!(
            "{:?} is not readable",
            path.display().to_string()
        )));
    }
    Ok(path.to_path_buf())
}

#[cfg(unix)]
fn is_traversable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string for the whole call.
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn is_traversable(path: &Path) -> bool {
    std::fs::read_dir(path).is_ok()
}

/// Render `dt` with `fmt`, or `None` if chrono cannot format it.
pub(crate) fn render_datetime<Tz>(dt: &DateTime<Tz>, fmt: &str) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", dt.format(fmt)).ok()?;
    Some(out)
}

/// Check that `fmt` actually encodes a date or time.
///
/// The pattern must parse, must produce a non-empty string without a path
/// separator for the current time, and must render the Unix epoch
/// differently from now.
pub fn date_format(fmt: &str) -> Result<String> {
    let now = Local::now();
    let Some(rendered) = render_datetime(&now, fmt) else {
        return Err(XshotError::InvalidDateFormat(format!(
            "datetime format {fmt:?} is not valid"
        )));
    };
    if rendered.is_empty() {
        return Err(XshotError::InvalidDateFormat(format!(
            "datetime format {fmt:?} results in empty string"
        )));
    }
    if rendered.contains(std::path::MAIN_SEPARATOR) {
        return Err(XshotError::InvalidDateFormat(format!(
            "datetime format {fmt:?} produces a path separator"
        )));
    }
    let epoch = Local
        .timestamp_opt(0, 0)
        .earliest()
        .and_then(|epoch| render_datetime(&epoch, fmt));
    if epoch.as_deref() == Some(rendered.as_str()) {
        return Err(XshotError::InvalidDateFormat(format!(
            "datetime format {fmt:?} has no date or time components"
        )));
    }
    Ok(fmt.to_owned())
}

/// A name template must be non-empty, stay inside its directory, and carry
/// a `{number}` placeholder.
pub fn name_format(fmt: &str) -> Result<String> {
    let field = || XshotError::InvalidValue {
        field: "name_format",
        value: format!("{fmt:?}"),
    };
    if fmt.is_empty() || fmt.contains(std::path::MAIN_SEPARATOR) {
        return Err(field());
    }
    if !NameTemplate::parse(fmt).has_number() {
        return Err(field());
    }
    Ok(fmt.to_owned())
}

pub fn prefix(prefix: &str) -> Result<String> {
    if prefix.contains(std::path::MAIN_SEPARATOR) {
        return Err(XshotError::InvalidValue {
            field: "prefix",
            value: format!("{prefix:?}"),
        });
    }
    Ok(prefix.to_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_accepts_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(directory(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn test_directory_rejects_missing_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = directory(&missing).unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = directory(&file).unwrap_err();
        assert!(matches!(err, XshotError::InvalidDirectory(_)));
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_date_format_accepts_real_directives() {
        assert_eq!(date_format("%Y-%m-%d").unwrap(), "%Y-%m-%d");
        assert!(date_format("%Y-%m-%d_%H-%M").is_ok());
        assert!(date_format("at %s").is_ok());
    }

    #[test]
    fn test_date_format_rejects_constant() {
        let err = date_format("screenshot").unwrap_err();
        assert!(matches!(err, XshotError::InvalidDateFormat(_)));
        assert!(err.to_string().contains("no date or time components"));
    }

    #[test]
    fn test_date_format_rejects_empty() {
        let err = date_format("").unwrap_err();
        assert!(err.to_string().contains("empty string"));
    }

    #[test]
    fn test_date_format_rejects_separator() {
        let err = date_format("%Y/%m").unwrap_err();
        assert!(matches!(err, XshotError::InvalidDateFormat(_)));
        assert!(err.to_string().contains("path separator"));
        assert!(date_format("%D").is_err());
    }

    #[test]
    fn test_date_format_rejects_unparseable() {
        let err = date_format("%Q%").unwrap_err();
        assert!(matches!(err, XshotError::InvalidDateFormat(_)));
    }

    #[test]
    fn test_name_format_requires_number() {
        assert!(name_format("{number}_{datetime}").is_ok());
        assert!(name_format("shot-{number}").is_ok());
        assert!(name_format("{datetime}").is_err());
        assert!(name_format("").is_err());
        assert!(name_format("a/{number}").is_err());
    }

    #[test]
    fn test_prefix_rejects_separator() {
        assert!(prefix("shot_").is_ok());
        assert!(prefix("").is_ok());
        assert!(prefix("../shot").is_err());
    }
}
