use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use wo_app::{AppError, AppResult, Case, RunOptions, load_case, run_design, run_solve_with_progress};
use wo_core::LogConfig;
use wo_solver::SolveProgressEvent;

#[derive(Parser)]
#[command(name = "wo-cli")]
#[command(about = "Wave energy converter optimal control and design tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate case file syntax and structure
    Validate {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
    },
    /// Solve the optimal control problem of a case
    Solve {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Write the full JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Time refinement of the reported signals
        #[arg(long)]
        nsubsteps: Option<usize>,
    },
    /// Run the design search of a case
    Design {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Write the full JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Solve {
            case_path,
            output,
            nsubsteps,
        } => cmd_solve(&case_path, output.as_deref(), nsubsteps),
        Commands::Design { case_path, output } => cmd_design(&case_path, output.as_deref()),
    }
}

/// `RUST_LOG` wins over the case's logging section.
fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load(case_path: &Path) -> AppResult<(Case, PathBuf)> {
    let case = load_case(case_path)?;
    init_tracing(&case.logging);
    let base_dir = case_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    tracing::debug!(case = %case.name, path = %case_path.display(), "loaded case");
    Ok((case, base_dir))
}

fn write_report<T: serde::Serialize>(path: &Path, report: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::InvalidInput(format!("Failed to serialize report: {e}")))?;
    std::fs::write(path, json)?;
    println!("✓ Report written to {}", path.display());
    Ok(())
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = load_case(case_path)?;
    println!("✓ Case '{}' is valid", case.name);
    if let Some(design) = &case.design {
        println!(
            "  Design parameters: {}",
            design.strategy.parameter_names().join(", ")
        );
    }
    Ok(())
}

fn cmd_solve(case_path: &Path, output: Option<&Path>, nsubsteps: Option<usize>) -> AppResult<()> {
    let (case, base_dir) = load(case_path)?;
    println!("Solving case: {}", case.name);

    let options = RunOptions {
        postprocess_nsubsteps: nsubsteps,
    };
    let mut last_emit = Instant::now();
    let report = run_solve_with_progress(&case, &base_dir, &options, &mut |event| {
        if last_emit.elapsed().as_millis() >= 100 {
            render_cli_progress(&event);
            last_emit = Instant::now();
        }
    })?;
    clear_progress_line();

    if report.success {
        println!("✓ {} ({} iterations)", report.message, report.iterations);
    } else {
        println!(
            "✗ {} (exit {}, {} iterations)",
            report.message, report.exit_code, report.iterations
        );
    }
    println!("  Objective: {:.6} W", report.objective);
    println!(
        "  Average power: {:.3} W mechanical, {:.3} W electrical",
        report.pto.average_mechanical_power_w, report.pto.average_electrical_power_w
    );
    println!("  Peak PTO force: {:.3} N", report.pto.peak_force_n);
    println!("  Constraint violation: {:.3e}", report.constraint_violation);
    println!("  Solve time: {:.3} s", report.solve_time_s);

    if let Some(path) = output {
        write_report(path, &report)?;
    }
    Ok(())
}

fn cmd_design(case_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let (case, base_dir) = load(case_path)?;
    println!("Running design search for case: {}", case.name);

    let report = run_design(&case, &base_dir)?;

    println!(
        "✓ {} search: {} evaluations, {} failed, {:.2} s",
        report.strategy,
        report.evaluations.len(),
        report.failures,
        report.search_time_s
    );
    match &report.best {
        Some(best) => {
            println!("  Best objective: {:.6}", best.value.unwrap_or(f64::NAN));
            for (name, value) in report.parameters.iter().zip(&best.params) {
                println!("    {name} = {value}");
            }
        }
        None => println!("  No successful sample"),
    }

    if let Some(path) = output {
        write_report(path, &report)?;
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &SolveProgressEvent) {
    let line = match event {
        SolveProgressEvent::Started { nvars, n_eq, n_in } => {
            format!("\rStarting: {nvars} variables, {n_eq} equalities, {n_in} inequalities")
        }
        SolveProgressEvent::Iteration {
            iteration,
            objective,
            constraint_violation,
            step_norm,
        } => format!(
            "\r[it {iteration:>4}] objective={objective:>12.4}  violation={constraint_violation:.2e}  step={step_norm:.2e}"
        ),
        SolveProgressEvent::Finished { .. } => return,
    };
    print!("{line}");
    let _ = io::stdout().flush();
}
