// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One invocation: open the form, then either extract its data or fill it.

use std::path::Path;

use tracing::{info, warn};

use formburner_core::error::Result;
use formburner_core::{BurnerConfig, TextCodec};
use formburner_document::{FieldRef, PdfForm};
use formburner_fields::{Extractor, Filler, FieldTree, yaml};

use crate::Cli;

/// What a successful run left for the user to look at.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Outcome {
    /// Fields whose value was rejected while filling.
    pub field_errors: usize,
    /// Fields written back into the document.
    pub fields_written: usize,
}

pub(crate) fn run(cli: &Cli) -> Result<Outcome> {
    let config = effective_config(cli)?;
    let mut form = PdfForm::open(&cli.input)?.with_need_appearances(config.need_appearances);
    let mut tree = form.field_tree();

    match (&cli.data, &cli.output) {
        (Some(data), Some(output)) => fill(&config, &mut form, &mut tree, data, output),
        (data, _) => {
            let target = data.as_deref().unwrap_or(&config.stdin_placeholder);
            extract(&config, &tree, target)?;
            Ok(Outcome::default())
        }
    }
}

/// Configuration file settings, overridden by command-line flags.
fn effective_config(cli: &Cli) -> Result<BurnerConfig> {
    let mut config = match &cli.config {
        Some(path) => BurnerConfig::load(path)?,
        None => BurnerConfig::default(),
    };
    config.show_types |= cli.show_types;
    config.annotate &= !cli.no_comments;
    Ok(config)
}

fn extract(config: &BurnerConfig, tree: &FieldTree<FieldRef>, target: &str) -> Result<()> {
    let extraction = Extractor::from_config(TextCodec::new(), config).run(tree);
    let text = yaml::to_string(&extraction, &config.header)?;
    yaml::write_path(target, config, &text)?;
    info!(
        fields = tree.leaf_count(),
        warnings = extraction.warnings.len(),
        "form data extracted"
    );
    Ok(())
}

fn fill(
    config: &BurnerConfig,
    form: &mut PdfForm,
    tree: &mut FieldTree<FieldRef>,
    data: &str,
    output: &Path,
) -> Result<Outcome> {
    let value = yaml::load_path(data, config)?;
    let errors = Filler::new(TextCodec::new()).run(tree, &value);
    if !errors.is_empty() {
        warn!(count = errors.len(), "some fields were left unchanged");
    }

    let fields_written = form.apply(tree)?;
    form.commit(output)?;
    Ok(Outcome {
        field_errors: errors.len(),
        fields_written,
    })
}
