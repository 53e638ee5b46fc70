//! assign-cli: command-line harness for the classroom assignment engine.
//!
//! # Commands
//!
//! - `assign`: partition a roster into classes and print the result
//! - `validate`: validate a roster file without solving
//! - `evaluate`: score an existing assignment against a roster
//! - `schema`: print example JSON for the request/response formats

use anyhow::{Context, Result};
use assign_core::config::EngineConfig;
use assign_core::models::{Assignment, RawRoster};
use assign_core::orchestrator::Orchestrator;
use assign_core::{evaluator, validator};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assign-cli")]
#[command(version = "0.1.0")]
#[command(about = "Classroom assignment engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition a roster into classes.
    Assign {
        /// Input roster JSON file path (use --stdin to read from stdin).
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Read the roster from stdin instead of a file.
        #[arg(long)]
        stdin: bool,

        /// Number of classes to partition into.
        #[arg(short = 'k', long)]
        classes: usize,

        /// Which solver to run: "greedy" or "cso".
        #[arg(long, default_value = "cso")]
        algorithm: String,

        /// Wall-clock deadline, in seconds, for the CSO solver.
        #[arg(long, default_value = "30")]
        timeout_seconds: u64,

        /// Output file path (defaults to stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a roster file without solving.
    Validate {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(long)]
        stdin: bool,

        /// Number of classes the roster will eventually be split into.
        #[arg(short = 'k', long)]
        classes: usize,
    },

    /// Score an existing assignment against a roster (no solving).
    Evaluate {
        /// Roster JSON file path.
        #[arg(value_name = "ROSTER")]
        roster: PathBuf,

        /// Assignment JSON file path: a flat array of class indices,
        /// one per student, in roster order.
        #[arg(value_name = "ASSIGNMENT")]
        assignment: PathBuf,

        #[arg(long)]
        pretty: bool,
    },

    /// Print example JSON for the request/response formats.
    Schema {
        /// Which schema to print: request, response, or all.
        #[arg(value_name = "TYPE", default_value = "all")]
        schema_type: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Assign {
            input,
            stdin,
            classes,
            algorithm,
            timeout_seconds,
            output,
            pretty,
        } => cmd_assign(input, stdin, classes, &algorithm, timeout_seconds, output, pretty),

        Commands::Validate { input, stdin, classes } => cmd_validate(input, stdin, classes),

        Commands::Evaluate { roster, assignment, pretty } => cmd_evaluate(roster, assignment, pretty),

        Commands::Schema { schema_type } => cmd_schema(&schema_type),
    }
}

fn read_input(file: Option<PathBuf>, use_stdin: bool) -> Result<String> {
    if use_stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = file {
        fs::read_to_string(&path).with_context(|| format!("failed to read file: {:?}", path))
    } else {
        anyhow::bail!("either provide an input file or use --stdin")
    }
}

fn parse_algorithm(name: &str) -> Result<assign_core::config::Algorithm> {
    match name {
        "greedy" => Ok(assign_core::config::Algorithm::Greedy),
        "cso" => Ok(assign_core::config::Algorithm::Cso),
        other => anyhow::bail!("unknown algorithm: {other} (expected \"greedy\" or \"cso\")"),
    }
}

fn cmd_assign(
    input: Option<PathBuf>,
    stdin: bool,
    classes: usize,
    algorithm: &str,
    timeout_seconds: u64,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let json_str = read_input(input, stdin)?;
    let raw: RawRoster = serde_json::from_str(&json_str).context("failed to parse roster JSON")?;

    let config = EngineConfig {
        algorithm: parse_algorithm(algorithm)?,
        timeout_seconds,
        ..Default::default()
    };

    log::info!("assigning {} students into {} classes", raw.students.len(), classes);
    let orchestrator = Orchestrator::new(config);
    let response = orchestrator
        .assign(&raw, classes)
        .map_err(|e| anyhow::anyhow!("assignment failed: {:?}", e))?;

    let output_json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };

    if let Some(output_path) = output {
        fs::write(&output_path, &output_json)
            .with_context(|| format!("failed to write output to {:?}", output_path))?;
        eprintln!("result written to {:?}", output_path);
    } else {
        println!("{}", output_json);
    }

    Ok(())
}

fn cmd_validate(input: Option<PathBuf>, stdin: bool, classes: usize) -> Result<()> {
    let json_str = read_input(input, stdin)?;
    let raw: RawRoster = serde_json::from_str(&json_str).context("JSON parse error")?;

    match validator::validate(&raw, classes, EngineConfig::default().min_class_size) {
        Ok(roster) => {
            println!(
                "{{\"valid\": true, \"studentCount\": {}, \"separationPairs\": {}, \"clusters\": {}}}",
                roster.len(),
                roster.separations().len(),
                roster.non_singleton_clusters().count()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "{{\"valid\": false, \"code\": \"{:?}\", \"message\": \"{}\"}}",
                e.code,
                e.message.replace('"', "\\\"")
            );
            Ok(())
        }
    }
}

fn cmd_evaluate(roster_path: PathBuf, assignment_path: PathBuf, pretty: bool) -> Result<()> {
    let roster_json = fs::read_to_string(&roster_path)
        .with_context(|| format!("failed to read roster file: {:?}", roster_path))?;
    let raw: RawRoster = serde_json::from_str(&roster_json).context("failed to parse roster JSON")?;

    let assignment_json = fs::read_to_string(&assignment_path)
        .with_context(|| format!("failed to read assignment file: {:?}", assignment_path))?;
    let class_of: Vec<usize> =
        serde_json::from_str(&assignment_json).context("failed to parse assignment JSON")?;

    let config = EngineConfig::default();
    let k = class_of.iter().copied().max().map_or(1, |m| m + 1);
    let validated = validator::validate(&raw, k, config.min_class_size)
        .map_err(|e| anyhow::anyhow!("roster failed validation: {:?}", e))?;
    let assignment = Assignment::new(class_of, k);

    let record = evaluator::evaluate(
        &validated,
        &assignment,
        &config.weights,
        0.0,
        config.algorithm,
        false,
        None,
    );

    let output_json = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{}", output_json);
    Ok(())
}

fn cmd_schema(schema_type: &str) -> Result<()> {
    match schema_type {
        "request" => print_request_schema(),
        "response" => print_response_schema(),
        "all" => {
            println!("=== REQUEST SCHEMA ===\n");
            print_request_schema()?;
            println!("\n=== RESPONSE SCHEMA ===\n");
            print_response_schema()?;
            Ok(())
        }
        _ => anyhow::bail!("unknown schema type: {schema_type}. Use: request, response, or all"),
    }
}

fn print_request_schema() -> Result<()> {
    let example = r#"{
  "students": [
    {
      "name": "Alice",
      "school": "Lincoln Elementary",
      "gender": "FEMALE",
      "academic": "HIGH",
      "behavior": "MEDIUM",
      "friends": ["Bob", "Carla"],
      "not_with": "Dave",
      "cluster_id": null,
      "comments": ""
    },
    {
      "name": "Bob",
      "school": "Lincoln Elementary",
      "gender": "MALE",
      "academic": "MEDIUM",
      "behavior": "MEDIUM",
      "friends": ["Alice"],
      "not_with": null,
      "cluster_id": null,
      "comments": ""
    }
  ]
}"#;
    println!("{}", example);
    Ok(())
}

fn print_response_schema() -> Result<()> {
    let example = r#"{
  "classes": [["Alice", "Bob"], ["Carla", "Dave"]],
  "metadata": {
    "strategy_used": "cso",
    "execution_time_seconds": 0.842,
    "solution_quality": 94,
    "fallback_used": false,
    "fallback_reason": null,
    "hard_constraints_satisfied": true,
    "violations": {
      "friend_satisfaction": 1.0,
      "gender_imbalance": 0.02,
      "academic_imbalance": 0.05,
      "behavior_imbalance": 0.03,
      "cluster_violations": 0,
      "separation_violations": 0,
      "size_imbalance": 1
    }
  }
}"#;
    println!("{}", example);
    Ok(())
}
