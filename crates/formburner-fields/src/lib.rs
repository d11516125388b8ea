// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formburner-fields — the document-independent half of formburner.
//
// Builds a tree out of flat dotted field names, projects it into a generic
// structured value (extraction), writes such a value back into the tree
// (filling), and serializes values as annotated YAML.

pub mod extract;
pub mod fill;
pub mod tree;
pub mod value;
pub mod yaml;

pub use extract::{Annotation, Annotations, Extraction, ExtractWarning, Extractor, ScalarStyle};
pub use fill::Filler;
pub use tree::{Branch, FieldCollision, FieldLeaf, FieldNode, FieldTree};
pub use value::{Scalar, Value};
