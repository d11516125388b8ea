// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: the closed set of form field variants and the text
// payloads they carry.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dot-separated position of a node in the field tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Split a fully qualified dotted name into its segments.
    pub fn parse(dotted: &str) -> Self {
        Self(dotted.split('.').map(str::to_owned).collect())
    }

    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_owned());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, i.e. the key the node is stored under.
    pub fn leaf_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

/// Bytes of a string in the document's own text-string encoding.
///
/// Conversion to and from Rust strings goes through [`crate::TextCodec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextString(Vec<u8>);

impl TextString {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Check,
    Push,
    Radio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Normal,
    Multiline,
    FileSelect,
}

/// List box or combo box state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceField {
    /// Option texts in document order.
    pub options: Vec<TextString>,
    /// Indices into `options`.
    pub selected: BTreeSet<usize>,
    pub multi_select: bool,
    /// Combo box accepting values outside `options`.
    pub editable: bool,
    /// Free-text value of an editable combo box, set instead of `selected`.
    pub edit_value: Option<TextString>,
}

/// Outcome of a signature validation computed by the document backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureStatus {
    SignatureValid,
    SignatureInvalid,
    SignatureDigestMismatch,
    SignatureDecodingError,
    SignatureGenericError,
    SignatureNotFound,
    SignatureNotVerified,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::SignatureValid => "SignatureValid",
            SignatureStatus::SignatureInvalid => "SignatureInvalid",
            SignatureStatus::SignatureDigestMismatch => "SignatureDigestMismatch",
            SignatureStatus::SignatureDecodingError => "SignatureDecodingError",
            SignatureStatus::SignatureGenericError => "SignatureGenericError",
            SignatureStatus::SignatureNotFound => "SignatureNotFound",
            SignatureStatus::SignatureNotVerified => "SignatureNotVerified",
        }
    }
}

/// Reported metadata of a signature field. Never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub status: SignatureStatus,
    pub signer: TextString,
    pub time: DateTime<Utc>,
    pub location: TextString,
    pub reason: TextString,
    pub signs_total_document: bool,
}

/// The five field kinds and their type-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldVariant {
    Button { kind: ButtonKind, state: bool },
    Text { kind: TextKind, content: TextString },
    Choice(ChoiceField),
    Signature(SignatureInfo),
}

impl FieldVariant {
    /// Short label used in type annotations and log lines.
    pub fn type_label(&self) -> &'static str {
        match self {
            FieldVariant::Button { kind: ButtonKind::Check, .. } => "Check",
            FieldVariant::Button { kind: ButtonKind::Push, .. } => "Push",
            FieldVariant::Button { kind: ButtonKind::Radio, .. } => "Radio",
            FieldVariant::Text { kind: TextKind::Normal, .. } => "Text",
            FieldVariant::Text { kind: TextKind::Multiline, .. } => "Multiline",
            FieldVariant::Text { kind: TextKind::FileSelect, .. } => "FileSelect",
            FieldVariant::Choice(choice) if choice.multi_select => "MultiChoice",
            FieldVariant::Choice(_) => "Choice",
            FieldVariant::Signature(_) => "Signature",
        }
    }
}

/// A field variant plus the attributes every kind shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub variant: FieldVariant,
    pub read_only: bool,
    /// User-facing name, when the document provides one.
    pub display_name: Option<TextString>,
    /// Name used when exporting the form's data elsewhere.
    pub mapping_name: Option<TextString>,
}

impl Field {
    pub fn new(variant: FieldVariant) -> Self {
        Self {
            variant,
            read_only: false,
            display_name: None,
            mapping_name: None,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_display_name(mut self, display_name: TextString) -> Self {
        self.display_name = Some(display_name);
        self
    }

    pub fn with_mapping_name(mut self, mapping_name: TextString) -> Self {
        self.mapping_name = Some(mapping_name);
        self
    }
}
