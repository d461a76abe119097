// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime settings: a JSON file with environment overrides on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::undo::DEFAULT_HISTORY_LIMIT;

pub const ENV_LOG: &str = "TREESYNC_LOG";
pub const ENV_UNDO_LIMIT: &str = "TREESYNC_UNDO_LIMIT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{name}={value:?} is not a valid setting")]
    Env { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Compound edits kept for undo; the oldest are evicted first.
    pub undo_history_limit: usize,
    /// `EnvFilter` directive used by [`crate::telemetry::init`].
    pub log_filter: String,
    /// Indent encoded batches.
    pub pretty_batches: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            undo_history_limit: DEFAULT_HISTORY_LIMIT,
            log_filter: "info".to_owned(),
            pretty_batches: false,
        }
    }
}

impl SyncConfig {
    /// Reads `path`; missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        let config = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Json { path: path.to_owned(), source })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Applies `TREESYNC_LOG` and `TREESYNC_UNDO_LIMIT` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(filter) = lookup(ENV_LOG).filter(|value| !value.trim().is_empty()) {
            self.log_filter = filter;
        }
        if let Some(raw) = lookup(ENV_UNDO_LIMIT) {
            self.undo_history_limit = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { name: ENV_UNDO_LIMIT, value: raw })?;
        }
        Ok(())
    }
}
