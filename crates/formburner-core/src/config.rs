// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BurnerError, Result};

/// Settings shared by the extract and fill passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnerConfig {
    /// Comment opening every emitted data file.
    pub header: String,
    /// Data-file argument that selects stdin (fill) or stdout (extract).
    pub stdin_placeholder: String,
    /// Emit choice lists, display names and read-only markers as comments.
    pub annotate: bool,
    /// Also annotate every field with its type.
    pub show_types: bool,
    /// Ask viewers to regenerate widget appearances after filling.
    pub need_appearances: bool,
}

impl Default for BurnerConfig {
    fn default() -> Self {
        Self {
            header: "Generated by formburner".to_owned(),
            stdin_placeholder: "-".to_owned(),
            annotate: true,
            show_types: false,
            need_appearances: true,
        }
    }
}

impl BurnerConfig {
    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            BurnerError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Whether a data-file argument designates a standard stream.
    pub fn is_std_stream(&self, argument: &str) -> bool {
        argument == self.stdin_placeholder
    }
}
