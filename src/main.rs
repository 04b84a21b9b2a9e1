//! l2survey CLI - Wrangle and model second-language survey data
//!
//! # Main Commands
//!
//! ```bash
//! l2survey analyze survey.csv questions.csv   # Full pipeline + report
//! l2survey fit survey.csv questions.csv -q q1 # Just the logistic fit
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! l2survey parse survey.csv                   # Parse CSV to JSON
//! l2survey reshape survey.csv                 # Wide -> long reshape to JSON
//! ```

use clap::{Parser, Subcommand};
use l2survey::{
    load_frame, load_frame_with_delimiter, pivot_longer, report, run_analysis,
    AnalysisOptions, Covariate, Language, LoadedFrame, QuestionPattern,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "l2survey")]
#[command(about = "Reshape, join, aggregate and model second-language survey data", long_about = None)]
struct Cli {
    /// Suppress progress logging
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reshape wide question columns to long form and output JSON rows
    Reshape {
        /// Input CSV file
        input: PathBuf,

        /// Question-column prefix
        #[arg(short, long, default_value = "q")]
        prefix: String,

        /// Participant identifier column
        #[arg(long, default_value = "id")]
        id_col: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: filter, reshape, join, aggregate, fit, report
    Analyze {
        /// Wide survey CSV file
        survey: PathBuf,

        /// Question metadata CSV file
        questions: PathBuf,

        /// Target question key for the accuracy curve and the fit
        #[arg(short = 'q', long, default_value = "q1")]
        question: String,

        /// Covariates: comma-separated subset of
        /// language,exposure_age,years_learning,total_score
        #[arg(short, long, default_value = "language,years_learning")]
        covariates: String,

        /// Reference level for the language covariate
        #[arg(short, long, default_value = "Spanish")]
        reference: String,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit the logistic model only and print its summary
    Fit {
        /// Wide survey CSV file
        survey: PathBuf,

        /// Question metadata CSV file
        questions: PathBuf,

        /// Target question key
        #[arg(short = 'q', long, default_value = "q1")]
        question: String,

        /// Covariates: comma-separated subset of
        /// language,exposure_age,years_learning,total_score
        #[arg(short, long, default_value = "language,years_learning")]
        covariates: String,

        /// Reference level for the language covariate
        #[arg(short, long, default_value = "Spanish")]
        reference: String,
    },
}

fn main() {
    let cli = Cli::parse();
    l2survey::logs::LOGGER.set_quiet(cli.quiet);

    let result = match cli.command {
        Commands::Parse { input, delimiter, output } => {
            cmd_parse(&input, delimiter, output.as_deref())
        }

        Commands::Reshape { input, prefix, id_col, output } => {
            cmd_reshape(&input, &prefix, &id_col, output.as_deref())
        }

        Commands::Analyze { survey, questions, question, covariates, reference, output } => {
            cmd_analyze(&survey, &questions, &question, &covariates, &reference, output.as_deref())
        }

        Commands::Fit { survey, questions, question, covariates, reference } => {
            cmd_fit(&survey, &questions, &question, &covariates, &reference)
        }
    };

    if let Err(e) = result {
        l2survey::logs::log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn load(input: &Path, delimiter: Option<char>) -> Result<LoadedFrame, Box<dyn std::error::Error>> {
    let loaded = match delimiter {
        Some(d) => load_frame_with_delimiter(input, d)?,
        None => load_frame(input)?,
    };
    eprintln!("   Encoding: {}", loaded.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        match loaded.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        },
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", loaded.frame.headers().join(", "));
    Ok(loaded)
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing CSV: {}", input.display());

    let loaded = load(input, delimiter)?;
    eprintln!("Parsed {} rows", loaded.frame.len());

    let json = serde_json::to_string_pretty(loaded.frame.rows())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_reshape(
    input: &Path,
    prefix: &str,
    id_col: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Reshaping: {}", input.display());

    let loaded = load(input, None)?;
    let long = pivot_longer(
        &loaded.frame,
        &QuestionPattern::new(prefix),
        id_col,
        "item",
        "correct",
    )?;
    eprintln!("{} rows -> {} observations", loaded.frame.len(), long.len());

    let json = serde_json::to_string_pretty(long.rows())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_analyze(
    survey: &Path,
    questions: &Path,
    question: &str,
    covariates: &str,
    reference: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(question, covariates, reference)?;
    let report = run_analysis(survey, questions, &options)?;

    println!("\nParticipants by first language:");
    println!("{}", report::render_frequency(&report.language_frequencies));

    println!("Per-subject totals:");
    println!(
        "{}",
        report::render_subject_totals(
            &report.subject_totals,
            &options.columns.id,
            &options.columns.language,
            "total",
        )
    );

    println!("Accuracy by years of learning ({}):", question);
    println!(
        "{}",
        report::render_curve(
            &report.accuracy_curve,
            &options.columns.language,
            "years_learning",
            "accuracy",
        )
    );

    println!("{}", report.model_summary);

    if report.dropped_observations > 0 {
        println!(
            "Note: {} observations were dropped by the metadata join.",
            report.dropped_observations
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, &json)?;
        eprintln!("Report written to: {}", path.display());
    }

    Ok(())
}

fn cmd_fit(
    survey: &Path,
    questions: &Path,
    question: &str,
    covariates: &str,
    reference: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(question, covariates, reference)?;
    let report = run_analysis(survey, questions, &options)?;
    println!("\n{}", report.model_summary);
    Ok(())
}

fn build_options(
    question: &str,
    covariates: &str,
    reference: &str,
) -> Result<AnalysisOptions, Box<dyn std::error::Error>> {
    let reference = Language::from_label(reference)
        .ok_or_else(|| format!("Unknown reference language: {}", reference))?;

    let mut parsed = Vec::new();
    for name in covariates.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let covariate = match name {
            "language" => Covariate::Language { reference },
            "exposure_age" => Covariate::ExposureAge,
            "years_learning" => Covariate::LearningDuration,
            "total_score" => Covariate::TotalScore,
            other => return Err(format!("Unknown covariate: {}", other).into()),
        };
        parsed.push(covariate);
    }
    if parsed.is_empty() {
        return Err("At least one covariate is required".into());
    }

    Ok(AnalysisOptions {
        target_question: question.to_string(),
        covariates: parsed,
        ..AnalysisOptions::default()
    })
}

fn write_output(content: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("Written to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        // Catches conflicting flag names across global args and subcommands
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_parses_question_short_with_quiet() {
        let cli = Cli::parse_from([
            "l2survey", "analyze", "survey.csv", "questions.csv", "-q", "q7", "--quiet",
        ]);
        assert!(cli.quiet);
        match cli.command {
            Commands::Analyze { question, .. } => assert_eq!(question, "q7"),
            _ => panic!("expected the analyze subcommand"),
        }
    }

    #[test]
    fn test_fit_parses_question_short() {
        let cli = Cli::parse_from(["l2survey", "fit", "s.csv", "m.csv", "-q", "q3"]);
        match cli.command {
            Commands::Fit { question, .. } => assert_eq!(question, "q3"),
            _ => panic!("expected the fit subcommand"),
        }
    }

    #[test]
    fn test_build_options_rejects_unknown_covariate() {
        assert!(build_options("q1", "language,wingspan", "Spanish").is_err());
        assert!(build_options("q1", "language", "Klingon").is_err());
        let opts = build_options("q2", "language,total_score", "French").unwrap();
        assert_eq!(opts.target_question, "q2");
        assert_eq!(opts.covariates.len(), 2);
    }
}
