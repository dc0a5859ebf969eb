//! evalkit CLI: score outputs, check rules, and run evaluation suites.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use evalkit_core::{evaluate_rules, token_f1, Dataset, DatasetKind, RuleRow, TestCase};
use evalkit_runtime::{ReplayClient, RunnerConfig, SuiteRunner};

/// Evaluate language-model outputs with golden answers, rules, and judges
#[derive(Parser, Debug)]
#[command(name = "evalkit", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Token-F1 of an output against an expected answer
    Score {
        #[arg(long)]
        actual: String,

        #[arg(long)]
        expected: String,
    },

    /// Check an output against phrase and word rules
    Check {
        /// The model output to check
        text: String,

        #[arg(long = "contains-any", value_name = "PHRASE")]
        contains_any: Vec<String>,

        #[arg(long = "not-contains-any", value_name = "PHRASE")]
        not_contains_any: Vec<String>,

        #[arg(long = "contains-word", value_name = "WORD")]
        contains_word: Vec<String>,

        #[arg(long = "not-contains-word", value_name = "WORD")]
        not_contains_word: Vec<String>,
    },

    /// Run datasets against recorded model outputs
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Dataset files; the kind comes from the file stem (golden, rules, judge)
    #[arg(required = true)]
    datasets: Vec<PathBuf>,

    /// JSONL of recorded {"input", "output"} pairs
    #[arg(long)]
    outputs: PathBuf,

    /// Run rules datasets
    #[arg(long)]
    rules: bool,

    /// Run golden datasets
    #[arg(long)]
    golden: bool,

    /// Run judge datasets
    #[arg(long)]
    judge: bool,

    /// Only fast checks (rules + golden)
    #[arg(long)]
    fast: bool,

    /// Test set name (defaults to each dataset's parent directory name)
    #[arg(long)]
    set: Option<String>,

    /// Write the report here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print every case to stderr
    #[arg(long)]
    show_cases: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn render<T: Serialize>(value: &T, format: Format) -> Result<String> {
    let text = match format {
        Format::Json => serde_json::to_string_pretty(value).context("Failed to encode JSON")?,
        Format::Yaml => serde_yaml::to_string(value).context("Failed to encode YAML")?,
    };
    Ok(text)
}

fn emit<T: Serialize>(value: &T, format: Format) -> Result<()> {
    let text = render(value, format)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text.trim_end()).context("Failed to write to stdout")?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = dispatch(cli);
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }
    ExitCode::from(exit_status(&result))
}

/// 0 when everything passed, 1 on failed cases, 2 on errors.
fn exit_status(result: &Result<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

/// Returns whether everything passed.
fn dispatch(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Score { actual, expected } => {
            let score = token_f1(&actual, &expected);
            emit(&score, cli.format)?;
            Ok(true)
        }
        Commands::Check {
            text,
            contains_any,
            not_contains_any,
            contains_word,
            not_contains_word,
        } => {
            let row = RuleRow {
                id: None,
                input: String::new(),
                must_contain_any: contains_any,
                must_not_contain_any: not_contains_any,
                must_contain_word: contains_word,
                must_not_contain_word: not_contains_word,
            };
            let outcome = evaluate_rules(&row, &text);
            emit(
                &CheckReport {
                    passed: outcome.passed(),
                    refusal: outcome.refusal.clone(),
                    failures: outcome.failures.clone(),
                },
                cli.format,
            )?;
            Ok(outcome.passed())
        }
        Commands::Run(args) => run(args, cli.format),
    }
}

#[derive(Debug, Serialize)]
struct CheckReport {
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    refusal: Option<String>,
    failures: Vec<String>,
}

fn run(args: RunArgs, format: Format) -> Result<bool> {
    let kinds = selected_kinds(args.rules, args.golden, args.judge, args.fast);

    let mut cases: Vec<TestCase> = Vec::new();
    for path in &args.datasets {
        let kind = infer_kind(path)?;
        if !kinds.contains(&kind) {
            tracing::info!(path = %path.display(), kind = %kind, "dataset kind not selected");
            continue;
        }
        let test_set = args.set.clone().unwrap_or_else(|| infer_set(path));
        let dataset = Dataset::from_file(path, kind, test_set)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?;
        cases.extend(dataset.cases());
    }

    if cases.is_empty() {
        return Err(anyhow!("No test cases selected"));
    }

    let client = ReplayClient::from_file(&args.outputs)
        .with_context(|| format!("Failed to load outputs {}", args.outputs.display()))?;
    let config = RunnerConfig::from_env().context("Invalid runner configuration")?;
    let runner = SuiteRunner::new(Arc::new(client), config);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = runtime.block_on(runner.run(&cases));

    if args.show_cases {
        for record in &report.records {
            eprintln!("{}\n", record.render());
        }
    }

    match &args.report {
        Some(path) => {
            let text = render(&report, format)?;
            fs::write(path, text)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            eprintln!("Saved report: {}", path.display());
        }
        None => emit(&report, format)?,
    }

    for record in report.failures() {
        eprintln!("{} {}", record.status.label(), record.case_id);
    }
    eprintln!("{}", report.summary);

    Ok(report.all_passed())
}

/// Kinds to run: the flagged ones, rules + golden for `--fast`, or all.
fn selected_kinds(rules: bool, golden: bool, judge: bool, fast: bool) -> Vec<DatasetKind> {
    if fast {
        return vec![DatasetKind::Rules, DatasetKind::Golden];
    }

    let flagged: Vec<DatasetKind> = [
        (rules, DatasetKind::Rules),
        (golden, DatasetKind::Golden),
        (judge, DatasetKind::Judge),
    ]
    .into_iter()
    .filter_map(|(on, kind)| on.then_some(kind))
    .collect();

    if flagged.is_empty() {
        DatasetKind::ALL.to_vec()
    } else {
        flagged
    }
}

fn infer_kind(path: &Path) -> Result<DatasetKind> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Cannot infer dataset kind from {}", path.display()))?;

    stem.parse::<DatasetKind>()
        .map_err(|e| anyhow!("{}: {}", path.display(), e))
}

fn infer_set(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string())
}
