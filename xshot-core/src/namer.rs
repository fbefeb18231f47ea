//! Output filename resolution.
//!
//! [`FileNamer`] either suggests the next free sequence-numbered name in the
//! output directory or derives a name from an explicit path, then refuses to
//! hand out a path that already exists.
//!
//! # Races
//!
//! The existence check in [`FileNamer::resolve`] and the write by the capture
//! tool are separate steps.  Another writer can still claim the same name in
//! between; nothing here locks or reserves the path.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use regex::Regex;

use crate::errors::{Result, XshotError};
use crate::settings::NamingSettings;
use crate::template::NameTemplate;
use crate::validate::render_datetime;

pub const DEFAULT_LOG_TARGET: &str = "xshot::namer";

/// Produces destination paths from [`NamingSettings`].
#[derive(Debug, Clone)]
pub struct FileNamer {
    settings: NamingSettings,
    log_target: String,
}

impl FileNamer {
    pub fn new(settings: NamingSettings) -> Self {
        Self {
            settings,
            log_target: DEFAULT_LOG_TARGET.to_owned(),
        }
    }

    /// Route this namer's log records to `target`.
    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    pub fn settings(&self) -> &NamingSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut NamingSettings {
        &mut self.settings
    }

    pub fn format_number(&self, number: u64) -> String {
        format!("{number:0width$}", width = *self.settings.digits.get())
    }

    pub fn format_datetime(&self, dt: &DateTime<Local>) -> Result<String> {
        let fmt = self.settings.date_format.get();
        render_datetime(dt, fmt).ok_or_else(|| {
            XshotError::InvalidDateFormat(format!("datetime format {fmt:?} is not valid"))
        })
    }

    /// Basename without extension: prefix plus the rendered template.
    pub fn format_basename(&self, datetime: &str, number: &str) -> String {
        NameTemplate::parse(self.settings.name_format.get()).render(
            self.settings.prefix.get(),
            number,
            datetime,
        )
    }

    /// Regex that recognises names this namer generates.
    pub fn name_pattern(&self) -> Result<Regex> {
        NameTemplate::parse(self.settings.name_format.get()).pattern(self.settings.prefix.get())
    }

    /// Absolute form of the configured directory.
    pub fn directory(&self) -> Result<PathBuf> {
        Ok(std::path::absolute(self.settings.directory.get())?)
    }

    /// Highest sequence number among regular files matching
    /// [`FileNamer::name_pattern`], or 0 when nothing matches.
    ///
    /// Names that don't match, numbers that don't fit a `u64`, and entries
    /// that are not regular files (after following symlinks) are skipped.
    pub fn find_max(&self) -> Result<u64> {
        let directory = self.directory()?;
        let pattern = self.name_pattern()?;
        log::debug!(target: self.log_target.as_str(), "pattern: {}", pattern.as_str());

        let mut max = 0;
        for entry in fs::read_dir(&directory)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(number) = pattern
                .captures(name)
                .and_then(|caps| caps.name("number"))
                .and_then(|m| m.as_str().parse::<u64>().ok())
            else {
                continue;
            };
            let is_file = fs::metadata(entry.path())
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if is_file {
                max = max.max(number);
            }
        }
        Ok(max)
    }

    /// Next sequence-numbered path in the output directory, stamped with the
    /// current local time.
    pub fn suggest_filename(&self) -> Result<PathBuf> {
        self.suggest_filename_at(&Local::now())
    }

    /// [`FileNamer::suggest_filename`] with an explicit timestamp.
    pub fn suggest_filename_at(&self, now: &DateTime<Local>) -> Result<PathBuf> {
        let number = self.format_number(self.find_max()?.saturating_add(1));
        let datetime = self.format_datetime(now)?;
        let basename = self.format_basename(&datetime, &number);
        let filename = format!("{basename}.{}", self.settings.extension.get());
        log::debug!(target: self.log_target.as_str(), "filename: {filename:?}");
        Ok(self.directory()?.join(filename))
    }

    /// Derive a path from an explicit filename.
    ///
    /// A directory component replaces the configured directory and an
    /// extension replaces the configured extension (case-folded); both go
    /// through the settings' validation, and neither is stored unless both
    /// are accepted.  The prefix is put in front of the file stem.  The
    /// directory is not scanned.
    pub fn parse_filename(&mut self, path: &Path) -> Result<PathBuf> {
        let invalid = || XshotError::InvalidValue {
            field: "file",
            value: format!("{:?}", path.display().to_string()),
        };
        let file_name = Path::new(path.file_name().ok_or_else(invalid)?);

        let mut staged = self.settings.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            staged.directory.set(parent.to_path_buf())?;
        }
        let stem = match file_name.extension() {
            Some(ext) => {
                let ext = ext.to_str().ok_or_else(invalid)?;
                staged.extension.set(ext.parse()?)?;
                file_name.file_stem().ok_or_else(invalid)?
            }
            None => file_name.as_os_str(),
        };
        self.settings = staged;

        let mut name = OsString::from(self.settings.prefix.get());
        name.push(stem);
        name.push(".");
        name.push(self.settings.extension.get().extension());
        Ok(self.directory()?.join(name))
    }

    /// Pick the destination path for the next capture.
    ///
    /// Uses `explicit` when given, otherwise the next suggested name.  Fails
    /// with [`XshotError::FileExists`] if anything is already at that path.
    pub fn resolve(&mut self, explicit: Option<&Path>) -> Result<PathBuf> {
        let candidate = match explicit {
            Some(path) => self.parse_filename(path)?,
            None => self.suggest_filename()?,
        };
        if candidate.symlink_metadata().is_ok() {
            return Err(XshotError::FileExists(candidate));
        }
        log::debug!(target: self.log_target.as_str(), "resolved {}", candidate.display());
        Ok(candidate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
