//! Simple CLI for payroll formula evaluation
//!
//! Evaluates, validates, and inspects expressions from the command line.

use clap::{Parser, Subcommand};
use paycalc::{Calculator, Decimal};
use std::collections::HashMap;
use std::process;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "paycalc")]
#[command(about = "Safe decimal expression calculator for payroll formulas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression
    Evaluate {
        /// Expression to evaluate, e.g. "GROSS * 0.78 + max(BONUS, 100)"
        expression: String,
        /// Variable binding, NAME=VALUE; may be repeated
        #[arg(short, long = "var")]
        vars: Vec<String>,
        /// Skip the result cache
        #[arg(long)]
        no_cache: bool,
        /// Print performance statistics as JSON after the result
        #[arg(long)]
        stats: bool,
    },
    /// Validate an expression without evaluating it for real
    Validate {
        /// Expression to validate
        expression: String,
        /// Variable binding, NAME=VALUE; may be repeated
        #[arg(short, long = "var")]
        vars: Vec<String>,
    },
    /// Show the variables and functions an expression depends on
    Deps {
        /// Expression to analyze
        expression: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            expression,
            vars,
            no_cache,
            stats,
        } => handle_evaluate(&expression, &vars, !no_cache, stats),
        Commands::Validate { expression, vars } => handle_validate(&expression, &vars),
        Commands::Deps { expression } => handle_deps(&expression),
    }
}

fn parse_bindings(vars: &[String]) -> HashMap<String, Decimal> {
    let mut bindings = HashMap::new();
    for var in vars {
        let Some((name, value)) = var.split_once('=') else {
            eprintln!("Invalid variable binding '{var}', expected NAME=VALUE");
            process::exit(1);
        };
        match Decimal::from_str(value.trim()) {
            Ok(decimal) => {
                bindings.insert(name.trim().to_string(), decimal);
            }
            Err(err) => {
                eprintln!("Invalid value for '{name}': {err}");
                process::exit(1);
            }
        }
    }
    bindings
}

fn handle_evaluate(expression: &str, vars: &[String], use_cache: bool, stats: bool) {
    let calc = Calculator::new();
    let bindings = parse_bindings(vars);
    let overrides = (!bindings.is_empty()).then_some(&bindings);

    match calc.evaluate(expression, overrides, use_cache) {
        Ok(result) => println!("{result}"),
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }

    if stats {
        let snapshot = calc.performance_stats();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("Failed to serialize stats: {err}"),
        }
    }
}

fn handle_validate(expression: &str, vars: &[String]) {
    let calc = Calculator::new();
    calc.set_variables(&parse_bindings(vars));

    let (valid, message) = calc.validate_expression(expression);
    println!("{message}");
    if !valid {
        process::exit(1);
    }
}

fn handle_deps(expression: &str) {
    let calc = Calculator::new();
    match calc.expression_dependencies(expression) {
        Ok(deps) => {
            println!("variables: {}", deps.variables.join(", "));
            println!("functions: {}", deps.functions.join(", "));
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}
