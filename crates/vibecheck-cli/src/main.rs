//! Vibecheck CLI
//!
//! ## Commands
//!
//! - `prepare`: split a ShareGPT-shaped corpus into training slices and a validation set
//! - `eval`: score models' tool calls against the reference completions of a record stream

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use vibecheck_core::{
    file_digest, prepare, read_raw_conversations, read_records, render_summary_table,
    write_eval_results_json, write_prepared, EvalResultsArtifact, EvaluationResult, Generator,
    Harness, HarnessConfig, PreparedManifest, TracingDiagnostics, TracingInstrumentation,
    DEFAULT_LIMIT,
};
use vibecheck_provider::{OpenAiChatClient, ProviderConfig};

const DEFAULT_MODELS: [&str; 3] = ["gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"];

#[derive(Parser)]
#[command(name = "vibecheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tool-call evaluation harness and dataset preparer", long_about = None)]
struct Cli {
    /// Enable verbose output (per-example comparison detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a source corpus into training_{50,100,500,all}.jsonl and validation.jsonl
    Prepare {
        /// Source conversations (JSON array or JSON lines)
        #[arg(short, long)]
        source: PathBuf,

        /// Directory receiving the record streams and manifest.json
        #[arg(short, long, default_value = "data")]
        out_dir: PathBuf,
    },

    /// Evaluate models against a record stream
    Eval {
        /// Record stream to evaluate
        #[arg(short, long, default_value = "data/training_all.jsonl")]
        file: PathBuf,

        /// Model to evaluate; repeat for several (default: gpt-4o, gpt-4o-mini, gpt-3.5-turbo)
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Number of leading examples attempted per model
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Also write the results as a JSON artifact
        #[arg(long)]
        results_json: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    vibecheck_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Prepare { source, out_dir } => cmd_prepare(&source, &out_dir).map(|_| ()),
        Commands::Eval {
            file,
            models,
            limit,
            results_json,
        } => {
            let config = ProviderConfig::from_env();
            if config.api_key.is_none() {
                bail!("OPENAI_API_KEY is not set (environment or .env)");
            }
            let client = OpenAiChatClient::new(config).context("Failed to build HTTP client")?;
            let models = if models.is_empty() {
                DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
            } else {
                models
            };
            let results =
                cmd_eval(&client, &file, &models, limit, results_json.as_deref()).await?;
            print!("{}", render_summary_table(&results));
            Ok(())
        }
    }
}

/// Prepare command
fn cmd_prepare(source: &Path, out_dir: &Path) -> Result<PreparedManifest> {
    let conversations = read_raw_conversations(source)
        .with_context(|| format!("Failed to read source corpus: {:?}", source))?;
    let dataset = prepare(&conversations);
    let manifest = write_prepared(out_dir, &dataset)?;

    info!(
        event = "prepare.finished",
        source = %source.display(),
        out_dir = %out_dir.display(),
        training = manifest.training_records,
        validation = manifest.validation_records,
    );
    for entry in &manifest.files {
        let short = entry.sha256.get(..12).unwrap_or(&entry.sha256);
        println!("{:<20} {:>6} records  {}", entry.file, entry.records, short);
    }
    Ok(manifest)
}

/// Eval command
async fn cmd_eval(
    generator: &dyn Generator,
    file: &Path,
    models: &[String],
    limit: usize,
    results_json: Option<&Path>,
) -> Result<Vec<EvaluationResult>> {
    let examples =
        read_records(file).with_context(|| format!("Failed to read record stream: {:?}", file))?;
    info!(
        file = %file.display(),
        examples = examples.len(),
        models = models.len(),
        limit = limit,
        "Starting evaluation"
    );

    let diagnostics = TracingDiagnostics;
    let instrumentation = TracingInstrumentation;
    let harness = Harness::new(generator, &diagnostics, &instrumentation)
        .with_config(HarnessConfig::default().with_limit(limit));
    let results = harness.run_models(&examples, models).await;

    for result in &results {
        info!(
            event = "eval.finished",
            model = %result.model,
            total_checks = result.total_checks,
            matches = result.matches,
            mismatches = result.mismatches,
            accuracy = result.accuracy,
        );
    }

    if let Some(path) = results_json {
        let digest = file_digest(file)?;
        let artifact = EvalResultsArtifact::new(
            file.display().to_string(),
            digest,
            harness.config().limit,
            results.clone(),
        );
        write_eval_results_json(path, &artifact)?;
        info!(path = %path.display(), "Wrote results artifact");
    }

    Ok(results)
}
