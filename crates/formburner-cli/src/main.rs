// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formburner — PDF form fields to annotated YAML and back.
//
// Entry point. Initialises logging, parses the command line and hands over
// to the run module.

mod run;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use formburner_core::human_errors::{HumanError, Severity, humanize_error};

/// Extract the fields of a PDF form to YAML, or fill them from YAML.
///
/// With only an input form, the data is written to stdout. With a data file
/// it is written there instead. With an output form as well, the data file
/// is read and the filled form is saved. A data file of `-` means
/// stdout/stdin.
#[derive(Debug, Parser)]
#[command(name = "formburner", version)]
pub(crate) struct Cli {
    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Annotate every field with its type
    #[arg(long)]
    pub show_types: bool,

    /// Emit bare data, without explanatory comments
    #[arg(long)]
    pub no_comments: bool,

    /// The PDF form to read
    pub input: PathBuf,

    /// YAML data file
    pub data: Option<String>,

    /// Where to save the filled form
    pub output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run::run(&cli) {
        Ok(outcome) if outcome.field_errors > 0 => {
            eprintln!(
                "{} field(s) could not be filled; see the messages above.",
                outcome.field_errors
            );
        }
        Ok(_) => {}
        Err(err) => {
            tracing::debug!(%err, "run failed");
            eprint!("{}", report(&humanize_error(&err)));
            process::exit(1);
        }
    }
}

/// Fatal error text for stderr.
fn report(human: &HumanError) -> String {
    let mut text = format!("error: {}\n       {}\n", human.message, human.suggestion);
    if human.severity == Severity::Transient {
        text.push_str("       This may be temporary; running the same command again can succeed.\n");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_positional_extracts() {
        let cli = Cli::try_parse_from(["formburner", "form.pdf"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("form.pdf"));
        assert!(cli.data.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.show_types);
    }

    #[test]
    fn all_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "formburner",
            "--show-types",
            "--no-comments",
            "--config",
            "burner.json",
            "form.pdf",
            "-",
            "filled.pdf",
        ])
        .unwrap();
        assert_eq!(cli.data.as_deref(), Some("-"));
        assert_eq!(cli.output, Some(PathBuf::from("filled.pdf")));
        assert_eq!(cli.config, Some(PathBuf::from("burner.json")));
        assert!(cli.show_types);
        assert!(cli.no_comments);
    }

    #[test]
    fn transient_errors_invite_a_retry() {
        let human = HumanError {
            message: "The filled PDF couldn't be saved.".into(),
            suggestion: "Check the output folder.".into(),
            severity: Severity::Transient,
        };
        let text = report(&human);
        assert!(text.starts_with("error: The filled PDF couldn't be saved.\n"));
        assert!(text.contains("running the same command again"));

        let permanent = HumanError {
            severity: Severity::Permanent,
            ..human
        };
        assert_eq!(report(&permanent).lines().count(), 2);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["formburner"]).is_err());
        assert!(Cli::try_parse_from(["formburner", "a", "b", "c", "d"]).is_err());
    }
}
