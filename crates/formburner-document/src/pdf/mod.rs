// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — field dictionaries, signatures, reading and writing forms.

pub mod fields;
pub mod reader;
pub mod signature;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use fields::FieldRef;
pub use reader::PdfForm;
