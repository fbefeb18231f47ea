//! Typed, defaulted, validated settings.
//!
//! A [`Setting`] pairs a declared default with an optional per-instance
//! override.  Writes go through the setting's validator; a rejected write
//! leaves the setting untouched.  [`NamingSettings`] groups the settings the
//! file namer needs and [`NamingSettingsBuilder`] applies overrides on top of
//! the declared defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::{Result, XshotError};
use crate::validate;

pub const DEFAULT_DIRECTORY: &str = "/tmp";
pub const DEFAULT_NAME_FORMAT: &str = "{number}_{datetime}";
pub const DEFAULT_PREFIX: &str = "";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M";
pub const DEFAULT_DIGITS: usize = 4;

/// Accepted zero-padding widths for the sequence number.
pub const DIGITS_RANGE: std::ops::RangeInclusive<usize> = 1..=20;

// ---------------------------------------------------------------------------
// Setting
// ---------------------------------------------------------------------------

/// A named value with a declared default and an optional validator.
#[derive(Debug, Clone)]
pub struct Setting<T> {
    name: &'static str,
    default: T,
    validator: Option<fn(&T) -> bool>,
    value: Option<T>,
}

impl<T: fmt::Debug> Setting<T> {
    pub fn new(name: &'static str, default: T) -> Self {
        Self {
            name,
            default,
            validator: None,
            value: None,
        }
    }

    pub fn with_validator(mut self, validator: fn(&T) -> bool) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The override if one was written, otherwise the declared default.
    pub fn get(&self) -> &T {
        self.value.as_ref().unwrap_or(&self.default)
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Validate and store `value`.
    ///
    /// Fails with [`XshotError::InvalidValue`] naming this setting when the
    /// validator rejects the value.
    pub fn set(&mut self, value: T) -> Result<()> {
        if let Some(validator) = self.validator {
            if !validator(&value) {
                return Err(XshotError::InvalidValue {
                    field: self.name,
                    value: format!("{value:?}"),
                });
            }
        }
        self.value = Some(value);
        Ok(())
    }

    /// Drop the override; [`Setting::get`] returns the default again.
    pub fn clear(&mut self) {
        self.value = None;
    }
}

// ---------------------------------------------------------------------------
// Image format
// ---------------------------------------------------------------------------

/// Output file types the capture tool is asked to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
    Gif,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpg, ImageFormat::Gif];

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Gif => "gif",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = XshotError;

    /// Case-insensitive: `PNG`, `Png` and `png` are all accepted.
    fn from_str(s: &str) -> Result<Self> {
        let folded = s.trim().to_ascii_lowercase();
        ImageFormat::ALL
            .into_iter()
            .find(|format| format.extension() == folded)
            .ok_or_else(|| {
                XshotError::InvalidExtension(format!("{s:?} is not one of png, jpg, gif"))
            })
    }
}

// ---------------------------------------------------------------------------
// Naming settings
// ---------------------------------------------------------------------------

/// Every setting the file namer consults.
#[derive(Debug, Clone)]
pub struct NamingSettings {
    /// Output directory.  Must exist and be traversable.
    pub directory: Setting<PathBuf>,
    /// Basename template with `{number}` and optional `{datetime}`.
    pub name_format: Setting<String>,
    /// Literal text prepended to every basename.
    pub prefix: Setting<String>,
    /// strftime pattern for `{datetime}`.
    pub date_format: Setting<String>,
    pub extension: Setting<ImageFormat>,
    /// Zero-padding width of the sequence number.
    pub digits: Setting<usize>,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            directory: Setting::new("directory", PathBuf::from(DEFAULT_DIRECTORY))
                .with_validator(|dir| validate::directory(dir).is_ok()),
            name_format: Setting::new("name_format", DEFAULT_NAME_FORMAT.to_owned())
                .with_validator(|fmt| validate::name_format(fmt).is_ok()),
            prefix: Setting::new("prefix", DEFAULT_PREFIX.to_owned())
                .with_validator(|prefix| validate::prefix(prefix).is_ok()),
            date_format: Setting::new("date_format", DEFAULT_DATE_FORMAT.to_owned())
                .with_validator(|fmt| validate::date_format(fmt).is_ok()),
            extension: Setting::new("extension", ImageFormat::default()),
            digits: Setting::new("digits", DEFAULT_DIGITS)
                .with_validator(|digits| DIGITS_RANGE.contains(digits)),
        }
    }
}

impl NamingSettings {
    pub fn builder() -> NamingSettingsBuilder {
        NamingSettingsBuilder::default()
    }

    /// Drop every override.
    pub fn reset(&mut self) {
        self.directory.clear();
        self.name_format.clear();
        self.prefix.clear();
        self.date_format.clear();
        self.extension.clear();
        self.digits.clear();
    }

    /// Owned, serialisable view of the effective values.
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            directory: self.directory.get().display().to_string(),
            name_format: self.name_format.get().clone(),
            prefix: self.prefix.get().clone(),
            date_format: self.date_format.get().clone(),
            extension: *self.extension.get(),
            digits: *self.digits.get(),
        }
    }
}

/// Effective naming settings at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSnapshot {
    pub directory: String,
    pub name_format: String,
    pub prefix: String,
    pub date_format: String,
    pub extension: ImageFormat,
    pub digits: usize,
}

/// Collects overrides, then writes each through [`Setting::set`].
#[derive(Debug, Clone, Default)]
pub struct NamingSettingsBuilder {
    directory: Option<PathBuf>,
    name_format: Option<String>,
    prefix: Option<String>,
    date_format: Option<String>,
    extension: Option<ImageFormat>,
    digits: Option<usize>,
}

impl NamingSettingsBuilder {
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn name_format(mut self, name_format: impl Into<String>) -> Self {
        self.name_format = Some(name_format.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    pub fn extension(mut self, extension: ImageFormat) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn digits(mut self, digits: usize) -> Self {
        self.digits = Some(digits);
        self
    }

    /// Start from the defaults and apply every override given.
    ///
    /// The first rejected override aborts the build.
    pub fn build(self) -> Result<NamingSettings> {
        let mut settings = NamingSettings::default();
        if let Some(directory) = self.directory {
            settings.directory.set(directory)?;
        }
        if let Some(name_format) = self.name_format {
            settings.name_format.set(name_format)?;
        }
        if let Some(prefix) = self.prefix {
            settings.prefix.set(prefix)?;
        }
        if let Some(date_format) = self.date_format {
            settings.date_format.set(date_format)?;
        }
        if let Some(extension) = self.extension {
            settings.extension.set(extension)?;
        }
        if let Some(digits) = self.digits {
            settings.digits.set(digits)?;
        }
        Ok(settings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
