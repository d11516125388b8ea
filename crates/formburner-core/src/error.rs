// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for formburner.
//
// `BurnerError` aborts a run. `FieldError` is scoped to a single field: it is
// reported, the field is left untouched, and the pass continues.

use std::fmt;

use thiserror::Error;

use crate::types::FieldPath;

/// Top-level error type for all formburner operations.
#[derive(Debug, Error)]
pub enum BurnerError {
    // -- Document open errors --
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document is locked: {0}")]
    Locked(String),

    #[error("unable to parse document {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("document has no form: {0}")]
    NoForm(String),

    #[error("form format not supported: {0}")]
    UnsupportedForm(String),

    // -- Document save errors --
    #[error("failed to save document: {0}")]
    Save(String),

    // -- Structured data --
    #[error("invalid form data: {0}")]
    Data(String),

    #[error("cannot render form data: {0}")]
    Emit(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BurnerError>;

/// Structural shape a field expected from the incoming data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Mapping,
    Sequence,
    String,
    Bool,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Mapping => "a mapping",
            Shape::Sequence => "a sequence of strings",
            Shape::String => "a string",
            Shape::Bool => "a boolean",
        };
        f.write_str(name)
    }
}

/// A failure confined to one field during a fill pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field '{path}' requires {expected}")]
    ShapeMismatch { path: FieldPath, expected: Shape },

    #[error("field '{0}' missing in the form data")]
    MissingField(FieldPath),

    #[error("illegal value '{value}' for field '{path}'")]
    InvalidChoice { path: FieldPath, value: String },

    #[error("field '{path}' cannot be filled: {reason}")]
    UnsupportedOperation { path: FieldPath, reason: &'static str },
}

impl FieldError {
    /// Path of the field the error refers to.
    pub fn path(&self) -> &FieldPath {
        match self {
            FieldError::ShapeMismatch { path, .. }
            | FieldError::InvalidChoice { path, .. }
            | FieldError::UnsupportedOperation { path, .. } => path,
            FieldError::MissingField(path) => path,
        }
    }
}
