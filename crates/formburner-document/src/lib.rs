// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formburner-document — the PDF side of formburner.
//
// Opens AcroForm documents with lopdf, enumerates their fields into a
// `FieldTree`, writes modified leaves back, and saves the result.

pub mod integrity;
pub mod pdf;

// Re-export the primary types so callers can use `formburner_document::PdfForm` etc.
pub use integrity::hash_bytes;
pub use pdf::fields::FieldRef;
pub use pdf::reader::PdfForm;
