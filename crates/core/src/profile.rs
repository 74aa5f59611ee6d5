//! JSON extraction profiles: optional settings plus the record types to register.

use crate::schema::RecordType;
use crate::settings::ExtractOverrides;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid profile: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("record type '{0}' is declared more than once")]
    DuplicateType(String),
}

/// Settings section of a profile, timeouts in milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSettings {
    pub ready_timeout_ms: Option<u64>,
    pub field_timeout_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub lookahead: Option<usize>,
}

impl ProfileSettings {
    pub fn to_overrides(&self) -> ExtractOverrides {
        ExtractOverrides {
            ready_timeout: self.ready_timeout_ms.map(Duration::from_millis),
            field_timeout: self.field_timeout_ms.map(Duration::from_millis),
            probe_timeout: self.probe_timeout_ms.map(Duration::from_millis),
            poll_interval: self.poll_interval_ms.map(Duration::from_millis),
            lookahead: self.lookahead,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub settings: ProfileSettings,
    #[serde(default)]
    pub types: Vec<RecordType>,
}

impl Profile {
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let profile: Profile = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for record in &profile.types {
            if !seen.insert(record.name()) {
                return Err(ProfileError::DuplicateType(record.name().to_owned()));
            }
        }
        Ok(profile)
    }

    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path)
            .map_err(|source| ProfileError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&json)
    }

    pub fn record_type(&self, name: &str) -> Option<&RecordType> {
        self.types.iter().find(|record| record.name() == name)
    }
}
