//! Core FortiOS domain types.
//!
//! This module provides the wire attribute map and the device version used
//! to select version-specific conversion behavior.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Untyped wire representation of a configuration object.
///
/// Keys follow the device's hyphenated naming (`source-ip`, `custom-field-name`).
pub type AttributeMap = serde_json::Map<String, serde_json::Value>;

/// FortiOS firmware version as reported by the device (`v7.2.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
}

impl DeviceVersion {
    /// Create a version from its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for DeviceVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let mut parts = digits.split('.');
        let mut next = |label: &str, required: bool| -> Result<u32> {
            match parts.next() {
                Some(part) => part.parse::<u32>().map_err(|_| {
                    Error::ParseError(format!("invalid {label} component in version `{s}`"))
                }),
                None if required => Err(Error::ParseError(format!(
                    "missing {label} component in version `{s}`"
                ))),
                None => Ok(0),
            }
        };

        let major = next("major", true)?;
        let minor = next("minor", true)?;
        let patch = next("patch", false)?;

        if parts.next().is_some() {
            return Err(Error::ParseError(format!("unexpected version format `{s}`")));
        }

        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for DeviceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for DeviceVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive range of device versions on which an attribute exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionRange {
    /// First version carrying the attribute
    pub since: Option<DeviceVersion>,
    /// Last version carrying the attribute
    pub until: Option<DeviceVersion>,
}

impl VersionRange {
    /// Available on every version.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            since: None,
            until: None,
        }
    }

    /// Available from `version` onwards.
    #[must_use]
    pub const fn since(version: DeviceVersion) -> Self {
        Self {
            since: Some(version),
            until: None,
        }
    }

    /// Available up to and including `version`.
    #[must_use]
    pub const fn until(version: DeviceVersion) -> Self {
        Self {
            since: None,
            until: Some(version),
        }
    }

    /// Returns true if the range is unrestricted.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    /// Returns true if `version` lies inside the range.
    #[must_use]
    pub fn contains(&self, version: &DeviceVersion) -> bool {
        self.since.map_or(true, |since| *version >= since)
            && self.until.map_or(true, |until| *version <= until)
    }
}
