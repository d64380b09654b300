//! `unidoc` subcommands: config-driven field reconciliation and its outputs.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::de::DeserializeOwned;
use unidoc_recon::align::parse_source_fields;
use unidoc_recon::document::write_unified_document;
use unidoc_recon::engine::extract_sources;
use unidoc_recon::model::{EvaluatedMap, HumanDecisions, ReconResult, SourceFields};
use unidoc_recon::report::{build_report, write_report, DEFAULT_REVIEW_THRESHOLD};
use unidoc_recon::{apply_overrides, ReconConfig, ReconError};

use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_NEEDS_REVIEW, EXIT_VALIDATION};
use crate::sources::read_component_docs;
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile one component from a TOML config file
    #[command(after_help = "\
Examples:
  unidoc run component1.recon.toml
  unidoc run component1.recon.toml --json
  unidoc run component1.recon.toml --strict
  unidoc run component1.recon.toml --fields component1_fields.json")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Exit with code 3 when any field needs review
        #[arg(long)]
        strict: bool,

        /// Read already-extracted fields (JSON, source → field list) instead of scanning data_dir
        #[arg(long, value_name = "FILE")]
        fields: Option<PathBuf>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  unidoc validate component1.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Apply human decisions to an evaluated field map
    #[command(after_help = "\
Examples:
  unidoc review output/component1_evaluated.json --decisions decisions.json
  unidoc review evaluated.json --decisions decisions.json -o reviewed.json")]
    Review {
        /// Evaluated field map (JSON)
        evaluated: PathBuf,

        /// Human decision map (JSON)
        #[arg(long)]
        decisions: PathBuf,

        /// Write the reviewed map here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Render the CSV review report for an evaluated field map
    #[command(after_help = "\
Examples:
  unidoc report reviewed.json
  unidoc report reviewed.json --threshold 0.75 -o report.csv")]
    Report {
        /// Evaluated field map (JSON)
        evaluated: PathBuf,

        /// Overall confidence below which a field needs review
        #[arg(long, default_value_t = DEFAULT_REVIEW_THRESHOLD)]
        threshold: f64,

        /// Write the CSV here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Render the unified document for an evaluated field map
    #[command(after_help = "\
Examples:
  unidoc document reviewed.json
  unidoc document reviewed.json -o component1_unified.txt")]
    Document {
        /// Evaluated field map (JSON)
        evaluated: PathBuf,

        /// Write the document here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, strict, fields } => cmd_run(config, json, strict, fields),
        ReconCommands::Validate { config } => cmd_validate(config),
        ReconCommands::Review { evaluated, decisions, output } => cmd_review(evaluated, decisions, output),
        ReconCommands::Report { evaluated, threshold, output } => cmd_report(evaluated, threshold, output),
        ReconCommands::Document { evaluated, output } => cmd_document(evaluated, output),
    }
}

// ============================================================================
// run / validate
// ============================================================================

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", config_path.display())))?;
    ReconConfig::from_toml(&config_str).map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "ok: component '{}', policy {}, review threshold {}",
        config.component, config.policy.strategy, config.review.threshold
    );
    Ok(())
}

fn cmd_run(config_path: PathBuf, json_output: bool, strict: bool, fields: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve paths relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let per_source = match fields {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
            parse_source_fields(&text)?
        }
        None => scan_sources(&config, base_dir)?,
    };

    let decisions: Option<HumanDecisions> = match &config.decisions {
        Some(path) => Some(read_json(&base_dir.join(path))?),
        None => None,
    };

    let result = unidoc_recon::run(&config, &per_source, decisions.as_ref())?;
    write_outputs(&config, base_dir, &result)?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} field(s), {} resolved, {} need review, {} without truth source, {} overridden",
        result.meta.component, s.total_fields, s.resolved, s.needs_review, s.no_truth_source, s.overridden,
    );

    if strict && s.needs_review > 0 {
        return Err(CliError::new(
            EXIT_NEEDS_REVIEW,
            format!("{} field(s) need review", s.needs_review),
        ));
    }
    Ok(())
}

fn scan_sources(config: &ReconConfig, base_dir: &Path) -> Result<SourceFields, CliError> {
    let data_dir = base_dir.join(&config.data_dir);
    let docs = read_component_docs(&data_dir, &config.component)
        .map_err(|e| CliError::io(format!("cannot scan {}: {e}", data_dir.display())))?;
    if docs.is_empty() {
        return Err(CliError::new(
            EXIT_ERROR,
            format!("no documentation found for component '{}'", config.component),
        )
        .with_hint(format!("expected {}/<source>/{}.txt", data_dir.display(), config.component)));
    }
    log::info!("found documentation from {} source(s)", docs.len());

    Ok(extract_sources(docs.iter().map(|(s, t)| (s.as_str(), t.as_str())))?)
}

fn write_outputs(config: &ReconConfig, base_dir: &Path, result: &ReconResult) -> Result<(), CliError> {
    let out = &config.output;
    if !(out.report || out.document || out.evaluated) {
        return Ok(());
    }

    let out_dir = base_dir.join(&out.dir);
    std::fs::create_dir_all(&out_dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", out_dir.display())))?;

    if out.report {
        let path = out_dir.join(out.report_file(&config.component));
        let rows = build_report(&result.fields, config.review.threshold)?;
        write_report(&rows, create(&path)?)?;
        eprintln!("wrote {}", path.display());
    }
    if out.document {
        let path = out_dir.join(out.document_file(&config.component));
        write_unified_document(&result.fields, create(&path)?)?;
        eprintln!("wrote {}", path.display());
    }
    if out.evaluated {
        let path = out_dir.join(out.evaluated_file(&config.component));
        write_json(&result.fields, Some(&path))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

// ============================================================================
// review / report / document
// ============================================================================

fn cmd_review(evaluated_path: PathBuf, decisions_path: PathBuf, output: Option<PathBuf>) -> Result<(), CliError> {
    let evaluated: EvaluatedMap = read_json(&evaluated_path)?;
    let decisions: HumanDecisions = read_json(&decisions_path)?;

    let reviewed = apply_overrides(evaluated, &decisions);
    write_json(&reviewed, output.as_deref())
}

fn cmd_report(evaluated_path: PathBuf, threshold: f64, output: Option<PathBuf>) -> Result<(), CliError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CliError::args(format!("--threshold must be within [0, 1], got {threshold}")));
    }
    let evaluated: EvaluatedMap = read_json(&evaluated_path)?;
    let rows = build_report(&evaluated, threshold)?;

    match output {
        Some(path) => write_report(&rows, create(&path)?)?,
        None => write_report(&rows, io::stdout().lock())?,
    }
    Ok(())
}

fn cmd_document(evaluated_path: PathBuf, output: Option<PathBuf>) -> Result<(), CliError> {
    let evaluated: EvaluatedMap = read_json(&evaluated_path)?;

    match output {
        Some(path) => write_unified_document(&evaluated, create(&path)?)?,
        None => write_unified_document(&evaluated, io::stdout().lock())?,
    }
    Ok(())
}

// ============================================================================
// IO helpers
// ============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::new(EXIT_VALIDATION, format!("{}: {e}", path.display())))
}

fn write_json<T: serde::Serialize>(value: &T, path: Option<&Path>) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
    match path {
        Some(path) => {
            let mut file = create(path)?;
            writeln!(file, "{json_str}").map_err(ReconError::from)?;
            file.flush().map_err(ReconError::from)?;
        }
        None => println!("{json_str}"),
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, CliError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}
