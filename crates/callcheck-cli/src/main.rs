//! Function-call checker CLI.
//!
//! Provides the `callcheck` binary. `evaluate` checks one model's decoded
//! responses for a set of test categories and writes a score file per
//! category; `summarize` folds existing score files into leaderboard
//! accuracies; `api-status` reruns ground-truth calls to see whether the
//! APIs behind the executable categories still answer as recorded.

mod dataset;
mod error;
mod runner;
mod score;
mod status;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use callcheck_check::{CheckerConfig, FunctionLibrary, ReqwestTransport};
use callcheck_core::{CategoryGroup, LeaderboardVersion, TestCategory};

use crate::dataset::{read_jsonl, ModelResponse, PossibleAnswer, TestItem};
use crate::error::CliError;
use crate::runner::{needs_possible_answers, Runner};
use crate::score::{read_score_summary, write_score_file, Leaderboard};
use crate::status::{check_executable_apis, check_rest_apis, ApiStatus, StatusRecord};

/// Correctness checker for function-calling model outputs.
#[derive(Parser)]
#[command(name = "callcheck", about = "Correctness checker for function-calling model outputs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Check a model's responses and write score files.
    Evaluate {
        /// Model whose responses are checked.
        #[arg(short, long)]
        model: String,

        /// Categories to check (repeatable).
        #[arg(short, long)]
        category: Vec<String>,

        /// Category group: ast, executable, all, non_python, python, python_ast.
        #[arg(short, long)]
        group: Option<String>,

        /// Dataset version: v1 or v2.
        #[arg(long, default_value = "v1")]
        dataset_version: String,

        /// Directory holding the test items.
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Directory holding the possible answers.
        #[arg(long, default_value = "./data/possible_answer")]
        answer_dir: PathBuf,

        /// Directory holding decoded responses, one subdirectory per model.
        #[arg(long, default_value = "./result")]
        result_dir: PathBuf,

        /// Directory score files are written to.
        #[arg(short = 'O', long, default_value = "./score")]
        score_dir: PathBuf,

        /// JSON checker configuration (defaults and environment otherwise).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Relative tolerance for real_time_match results.
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Print leaderboard accuracies from existing score files.
    Summarize {
        /// Directory holding score files, one subdirectory per model.
        #[arg(short = 'O', long, default_value = "./score")]
        score_dir: PathBuf,
    },

    /// Rerun ground-truth calls and report unhealthy APIs.
    ApiStatus {
        /// Ground truth for the non-REST executable helpers.
        #[arg(
            long,
            default_value = "./data/api_status_check_data/api_status_check_ground_truth_executable.json"
        )]
        executable: PathBuf,

        /// Ground truth for the REST endpoints, credentials already applied.
        #[arg(
            long,
            default_value = "./data/api_status_check_data/api_status_check_ground_truth_REST.json"
        )]
        rest: PathBuf,

        /// Skip the REST endpoints.
        #[arg(long)]
        skip_rest: bool,

        /// JSON checker configuration (defaults and environment otherwise).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Evaluate {
            model,
            category,
            group,
            dataset_version,
            data_dir,
            answer_dir,
            result_dir,
            score_dir,
            config,
            tolerance,
        } => run_evaluate(EvaluateArgs {
            model,
            categories: category,
            group,
            dataset_version,
            data_dir,
            answer_dir,
            result_dir,
            score_dir,
            config,
            tolerance,
        }),
        Commands::Summarize { score_dir } => run_summarize(&score_dir),
        Commands::ApiStatus {
            executable,
            rest,
            skip_rest,
            config,
        } => run_api_status(&executable, (!skip_rest).then_some(rest.as_path()), config.as_deref()),
    };
    process::exit(exit_code);
}

struct EvaluateArgs {
    model: String,
    categories: Vec<String>,
    group: Option<String>,
    dataset_version: String,
    data_dir: PathBuf,
    answer_dir: PathBuf,
    result_dir: PathBuf,
    score_dir: PathBuf,
    config: Option<PathBuf>,
    tolerance: Option<f64>,
}

/// Execute the evaluate subcommand.
///
/// Returns exit code: 0 = success, 1 = invalid arguments or config,
/// 3 = I/O or data error.
fn run_evaluate(args: EvaluateArgs) -> i32 {
    let categories = match select_categories(&args.categories, args.group.as_deref()) {
        Ok(categories) => categories,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 1;
        }
    };
    let version = match parse_dataset_version(&args.dataset_version) {
        Ok(version) => version,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 1;
        }
    };
    let config = match load_config(args.config.as_deref(), args.tolerance) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let transport = match ReqwestTransport::new() {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Error: {}", CliError::from(e));
            return 3;
        }
    };

    let library = FunctionLibrary::with_defaults();
    let runner = Runner {
        config: &config,
        library: &library,
        transport: &transport,
        model_name: &args.model,
    };
    let model_dir = model_dir_name(&args.model);

    let mut leaderboard = Leaderboard::new();
    for category in categories {
        let file_name = category.file_name(version);
        let result_file = args
            .result_dir
            .join(&model_dir)
            .join(file_name.replace(".json", "_result.json"));
        if !result_file.exists() {
            tracing::warn!(%category, path = %result_file.display(), "no responses, skipping");
            continue;
        }

        let outcome = evaluate_category(
            &runner,
            category,
            &args.data_dir.join(&file_name),
            &args.answer_dir.join(&file_name),
            &result_file,
        )
        .and_then(|report| {
            let path = args
                .score_dir
                .join(&model_dir)
                .join(category.score_file_name());
            write_score_file(&path, &report.score, &report.failures)?;
            Ok(report)
        });

        match outcome {
            Ok(report) => {
                println!(
                    "{}: {:.4} ({}/{})",
                    report.category,
                    report.score.accuracy,
                    report.score.correct_count,
                    report.score.total_count
                );
                leaderboard.record(&args.model, category, report.score);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 3;
            }
        }
    }

    if let Some(summary) = leaderboard.summary(&args.model) {
        print_json(&summary);
    }
    0
}

/// Execute the summarize subcommand.
///
/// Returns exit code: 0 = success, 3 = I/O error.
fn run_summarize(score_dir: &Path) -> i32 {
    let entries = match fs::read_dir(score_dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", score_dir.display(), e);
            return 3;
        }
    };

    let mut model_dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    model_dirs.sort();

    let mut leaderboard = Leaderboard::new();
    for dir in &model_dirs {
        let Some(model) = dir.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        for category in TestCategory::ALL {
            let path = dir.join(category.score_file_name());
            if !path.exists() {
                continue;
            }
            match read_score_summary(&path) {
                Ok(score) => leaderboard.record(model, category, score),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 3;
                }
            }
        }
    }

    let summaries: Vec<_> = leaderboard
        .models()
        .filter_map(|model| leaderboard.summary(model))
        .collect();
    print_json(&summaries);
    0
}

/// Execute the api-status subcommand.
///
/// Returns exit code: 0 = all APIs healthy, 1 = invalid config,
/// 2 = unhealthy APIs found, 3 = I/O error.
fn run_api_status(executable: &Path, rest: Option<&Path>, config: Option<&Path>) -> i32 {
    let config = match load_config(config, None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let records: Vec<StatusRecord> = match read_jsonl(executable) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 3;
        }
    };
    let library = FunctionLibrary::with_defaults();
    let executable_status = check_executable_apis(&records, &library, &config);
    report_api_status("Non-REST", &executable_status);

    let mut healthy = executable_status.is_healthy();
    if let Some(rest) = rest {
        let records: Vec<StatusRecord> = match read_jsonl(rest) {
            Ok(records) => records,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 3;
            }
        };
        let transport = match ReqwestTransport::new() {
            Ok(transport) => transport,
            Err(e) => {
                eprintln!("Error: {}", CliError::from(e));
                return 3;
            }
        };
        let rest_status = check_rest_apis(&records, &transport, &config);
        report_api_status("REST", &rest_status);
        healthy &= rest_status.is_healthy();
    }

    if healthy {
        println!("All API status checks passed.");
        0
    } else {
        2
    }
}

fn report_api_status(group: &str, status: &ApiStatus) {
    if status.is_healthy() {
        println!("{} APIs: {} failed", group, status.error_rate());
        return;
    }
    eprintln!(
        "Warning: unable to verify health of the {} APIs used in executable categories.",
        group
    );
    eprintln!("{} APIs affected:", status.error_rate());
    for failure in &status.failures {
        eprintln!("  - Test Case: {}", failure.call);
        eprintln!("    Error Type: {}", failure.error_type);
    }
}

fn evaluate_category(
    runner: &Runner<'_, ReqwestTransport>,
    category: TestCategory,
    items_file: &Path,
    answers_file: &Path,
    result_file: &Path,
) -> Result<runner::CategoryReport, CliError> {
    let items: Vec<TestItem> = read_jsonl(items_file)?;
    let responses: Vec<ModelResponse> = read_jsonl(result_file)?;
    let answers: Vec<PossibleAnswer> = if needs_possible_answers(category) {
        read_jsonl(answers_file)?
    } else {
        Vec::new()
    };
    runner.evaluate(category, &items, &answers, &responses)
}

/// Resolve the categories to check: explicit ones first, then the group.
/// Nothing selected means every category.
fn select_categories(names: &[String], group: Option<&str>) -> Result<Vec<TestCategory>, String> {
    let mut categories = Vec::new();
    for name in names {
        let category: TestCategory = name.parse().map_err(|e| format!("{}", e))?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if let Some(group) = group {
        let group: CategoryGroup = group.parse().map_err(|e| format!("{}", e))?;
        for category in group.categories() {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
    }
    if categories.is_empty() {
        categories = TestCategory::ALL.to_vec();
    }
    Ok(categories)
}

/// Parse a dataset version string to `LeaderboardVersion`.
fn parse_dataset_version(s: &str) -> Result<LeaderboardVersion, String> {
    match s {
        "v1" | "V1" => Ok(LeaderboardVersion::V1),
        "v2" | "V2" => Ok(LeaderboardVersion::V2),
        _ => Err(format!("invalid dataset version '{}', expected v1/v2", s)),
    }
}

/// File config replaces the defaults; environment overrides and the
/// tolerance flag apply on top, in that order.
fn load_config(path: Option<&Path>, tolerance: Option<f64>) -> Result<CheckerConfig, CliError> {
    let base = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| CliError::Config {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => CheckerConfig::default(),
    };
    let mut config = base.with_overrides(|key| std::env::var(key).ok());
    if let Some(tolerance) = tolerance {
        config.real_time_tolerance = tolerance;
    }
    Ok(config)
}

/// Model names may contain `/`; score and result directories use `_`.
fn model_dir_name(model: &str) -> String {
    model.replace('/', "_")
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize summary: {}\"}}", e));
    println!("{}", json);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_categories_come_before_the_group() {
        let categories =
            select_categories(&["rest".to_string(), "simple".to_string()], Some("non_python"))
                .unwrap();
        assert_eq!(
            categories,
            vec![
                TestCategory::Rest,
                TestCategory::Simple,
                TestCategory::Java,
                TestCategory::Javascript
            ]
        );
        assert_eq!(select_categories(&[], None).unwrap().len(), TestCategory::ALL.len());
        assert!(select_categories(&["bogus".to_string()], None).is_err());
    }

    #[test]
    fn dataset_versions() {
        assert_eq!(parse_dataset_version("v2").unwrap(), LeaderboardVersion::V2);
        assert!(parse_dataset_version("v3").is_err());
    }

    #[test]
    fn tolerance_flag_wins_over_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"real_time_tolerance": 0.05, "call_order": "strict"}"#,
        )
        .unwrap();

        let config = load_config(Some(file.path()), None).unwrap();
        assert_eq!(config.call_order, callcheck_check::CallOrder::Strict);
        assert!(config.real_time_tolerance > 0.0);

        let config = load_config(Some(file.path()), Some(0.5)).unwrap();
        assert_eq!(config.real_time_tolerance, 0.5);
    }

    #[test]
    fn malformed_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{not json").unwrap();
        assert!(matches!(
            load_config(Some(file.path()), None),
            Err(CliError::Config { .. })
        ));
    }

    #[test]
    fn model_directories_escape_slashes() {
        assert_eq!(model_dir_name("meetkai/functionary-small-v2.2-FC"), "meetkai_functionary-small-v2.2-FC");
    }
}
