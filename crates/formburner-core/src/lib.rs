// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formburner — Core types, error definitions and the text-string codec shared
// across all crates.

pub mod codec;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use codec::TextCodec;
pub use config::BurnerConfig;
pub use error::{BurnerError, FieldError};
pub use types::*;
