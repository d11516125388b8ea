// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for fatal errors.
//
// The CLI prints these instead of the raw error chain so that whoever is
// filling the form knows what to do next.

use crate::error::BurnerError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something on the user's side must change (path, password, data file).
    ActionRequired,
    /// The input cannot be processed as it is.
    Permanent,
    /// Running again may succeed (disk full, interrupted write).
    Transient,
}

/// A plain-English error summary with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `BurnerError` into a `HumanError`.
pub fn humanize_error(err: &BurnerError) -> HumanError {
    match err {
        // -- Document open errors --
        BurnerError::NotFound(path) => HumanError {
            message: "The PDF file couldn't be found.".into(),
            suggestion: format!("Check the path and try again. ({path})"),
            severity: Severity::ActionRequired,
        },

        BurnerError::Locked(_) => HumanError {
            message: "This PDF is locked.".into(),
            suggestion: "The document is encrypted. Remove the password protection with your PDF viewer, then try again.".into(),
            severity: Severity::ActionRequired,
        },

        BurnerError::Parse { .. } => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged or not a PDF at all. Try opening it in a viewer to check it works.".into(),
            severity: Severity::Permanent,
        },

        BurnerError::NoForm(_) => HumanError {
            message: "This PDF has no form.".into(),
            suggestion: "Only PDFs with fillable fields can be extracted or filled. Check that you picked the right file.".into(),
            severity: Severity::Permanent,
        },

        BurnerError::UnsupportedForm(_) => HumanError {
            message: "This PDF form format isn't supported.".into(),
            suggestion: "The form is built with XFA only. Save it as a standard PDF form in a form editor, then try again.".into(),
            severity: Severity::Permanent,
        },

        // -- Save errors --
        BurnerError::Save(detail) => HumanError {
            message: "The filled PDF couldn't be saved.".into(),
            suggestion: format!("Check that the output folder exists and is writable. ({detail})"),
            severity: Severity::Transient,
        },

        // -- Data errors --
        BurnerError::Data(detail) => HumanError {
            message: "The form data file couldn't be read.".into(),
            suggestion: format!("Check the YAML syntax near the reported position. ({detail})"),
            severity: Severity::ActionRequired,
        },

        BurnerError::Emit(detail) => HumanError {
            message: "The form data couldn't be written as YAML.".into(),
            suggestion: format!("This is a bug in formburner; please report it. ({detail})"),
            severity: Severity::Permanent,
        },

        BurnerError::Config(detail) => HumanError {
            message: "The configuration file couldn't be used.".into(),
            suggestion: format!("Fix or remove the configuration file. ({detail})"),
            severity: Severity::ActionRequired,
        },

        BurnerError::Serialization(err) => HumanError {
            message: "The configuration file couldn't be used.".into(),
            suggestion: format!("The file is not valid JSON. ({err})"),
            severity: Severity::ActionRequired,
        },

        BurnerError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Check the paths on the command line.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied while reading or writing a file.".into(),
                suggestion: "Check the file permissions, or write the output somewhere else.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                severity: Severity::Transient,
            },
        },
    }
}
