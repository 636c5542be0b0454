use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use ax_core::NodeId;
use ax_sim::{
    AeroelasticModel, CantileverCase, CouplingScheme, GustCase, SimProgress, SimRecord,
    SimulationConfig, WingCase, run_with_progress,
};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "ax-cli")]
#[command(about = "Aeroflex CLI - coupled aeroelastic time marching", long_about = None)]
struct Cli {
    /// Log more detail (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a built-in case
    Run {
        case: Case,
        /// YAML run settings; missing keys keep their defaults
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Time step in seconds
        #[arg(long)]
        dt: Option<f64>,
        /// End time in seconds
        #[arg(long)]
        t_end: Option<f64>,
        #[arg(long)]
        scheme: Option<Scheme>,
        /// Write the tip history as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Log solver phase timings at the end of the run
        #[arg(long)]
        timing: bool,
    },
    /// Print the default run settings as YAML
    Settings,
}

#[derive(Clone, Copy, ValueEnum)]
enum Case {
    /// Clamped beam under a tip load, no aerodynamics
    Cantilever,
    /// Clamped wing at incidence
    Wing,
    /// Wing with a plunging root
    Plunge,
    /// Wing at zero incidence hit by a 1 - cos gust
    Gust,
    /// Plunging wing with an oscillating outboard flap
    Flap,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scheme {
    Staggered,
    Strong,
}

impl From<Scheme> for CouplingScheme {
    fn from(s: Scheme) -> Self {
        match s {
            Scheme::Staggered => CouplingScheme::Staggered,
            Scheme::Strong => CouplingScheme::Strong,
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            case,
            settings,
            dt,
            t_end,
            scheme,
            output,
            timing,
        } => {
            let mut config = match settings {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)?;
                    tracing::info!(path = %path.display(), "loaded run settings");
                    SimulationConfig::from_yaml(&text)?
                }
                None => SimulationConfig::default(),
            };
            if let Some(dt) = dt {
                config.driver.dt = dt;
            }
            if let Some(t_end) = t_end {
                config.driver.t_end = t_end;
            }
            if let Some(scheme) = scheme {
                config.coupling.scheme = scheme.into();
            }
            if timing {
                ax_core::timing::enable_timing();
            }
            cmd_run(case, &config, output.as_deref())
        }
        Commands::Settings => {
            print!("{}", SimulationConfig::default().to_yaml()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_case(case: Case) -> CliResult<(AeroelasticModel, NodeId)> {
    if let Case::Cantilever = case {
        let cantilever = CantileverCase::default();
        return Ok((cantilever.build()?, cantilever.tip()));
    }
    let wing = match case {
        Case::Plunge => WingCase {
            plunge_amplitude: 0.05,
            ..Default::default()
        },
        Case::Gust => WingCase {
            incidence: 0.0,
            gust: Some(GustCase {
                length: 4.0,
                intensity: 1.0,
                offset: 1.0,
            }),
            ..Default::default()
        },
        Case::Flap => WingCase {
            plunge_amplitude: 0.02,
            flap_amplitude: Some(0.1),
            ..Default::default()
        },
        _ => WingCase::default(),
    };
    Ok((wing.build()?, wing.tip()))
}

fn cmd_run(case: Case, config: &SimulationConfig, output: Option<&Path>) -> CliResult<()> {
    let (model, tip) = build_case(case)?;
    println!(
        "Running {:?} coupling: dt = {:.4} s, t_end = {:.3} s",
        config.coupling.scheme, config.driver.dt, config.driver.t_end
    );

    let started = Instant::now();
    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let result = run_with_progress(
        &model,
        config,
        Some(&mut |p: SimProgress| {
            let emit_now = (p.fraction_complete - last_fraction).abs() >= 0.005
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_progress(&p, started.elapsed().as_secs_f64());
                last_fraction = p.fraction_complete;
                last_emit = Instant::now();
            }
        }),
    );
    clear_progress_line();

    let record = match result {
        Ok(record) => record,
        Err(e) => {
            if let Some(last) = e.last_accepted() {
                println!("✗ Last accepted step: {} at t = {:.4} s", last.step, last.time);
            }
            return Err(e.into());
        }
    };
    println!(
        "✓ Simulation completed in {:.2}s",
        started.elapsed().as_secs_f64()
    );
    print_summary(&record, tip);

    if let Some(path) = output {
        std::fs::write(path, tip_history_csv(&record, tip))?;
        println!("✓ Exported {} records to {}", record.steps.len(), path.display());
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_progress(p: &SimProgress, elapsed: f64) {
    let width = 28usize;
    let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
    print!(
        "\r[{}{}] {:>6.2}%  t={:.3}/{:.3}s  step={}  cutbacks={}  elapsed={:.1}s",
        "#".repeat(filled),
        "-".repeat(width - filled),
        p.fraction_complete * 100.0,
        p.sim_time,
        p.t_end,
        p.step,
        p.cutback_retries,
        elapsed
    );
    let _ = io::stdout().flush();
}

fn print_summary(record: &SimRecord, tip: NodeId) {
    println!("\nRun summary:");
    println!("  Accepted steps:  {}", record.accepted_steps);
    println!("  Recorded steps:  {}", record.steps.len());
    println!("  Cutback retries: {}", record.cutback_retries);

    let iterations = record.steps.iter().map(|r| r.diagnostics.iterations);
    if let Some(max) = iterations.clone().max() {
        let mean = iterations.sum::<usize>() as f64 / record.steps.len() as f64;
        println!("  Coupling iterations: mean {:.2}, max {}", mean, max);
    }
    if let Some(defect) = record.max_kelvin_defect() {
        println!("  Max Kelvin defect: {:.3e}", defect);
    }
    if let Some(last) = record.last() {
        if let Some(node) = last.structure.node(tip) {
            let p = node.position;
            println!(
                "  Tip at t = {:.3} s: ({:.5}, {:.5}, {:.5}) m",
                last.time, p.x, p.y, p.z
            );
        }
        if let Some(aero) = &last.aero {
            let f = aero.total_force();
            println!("  Aerodynamic force: ({:.3}, {:.3}, {:.3}) N", f.x, f.y, f.z);
        }
    }
}

fn tip_history_csv(record: &SimRecord, tip: NodeId) -> String {
    let mut csv = String::from("time_s,tip_x_m,tip_y_m,tip_z_m,lift_n,iterations,kelvin_defect\n");
    for r in &record.steps {
        let Some(node) = r.structure.node(tip) else {
            continue;
        };
        let lift = r.aero.as_ref().map_or(0.0, |a| a.total_force().z);
        let defect = r.diagnostics.kelvin_defect.unwrap_or(0.0);
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.time,
            node.position.x,
            node.position.y,
            node.position.z,
            lift,
            r.diagnostics.iterations,
            defect
        ));
    }
    csv
}
