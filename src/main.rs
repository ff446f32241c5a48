// src/main.rs - Wall plotter host: run a G-code program through the motion core
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wallplot_rs::hardware::TracingPins;
use wallplot_rs::{
    Config, GCodeExecutor, Plotter, PlotterStatus, ProgramReport, SimClock, StdClock, TimeInterface,
    UnipolarCoils, load_config,
};

#[derive(Parser, Debug)]
#[command(name = "plotter-host", version, about = "Drive a two-cable wall plotter from G-code")]
struct Args {
    /// G-code program to draw
    program: PathBuf,

    /// Machine configuration (TOML)
    #[arg(short, long, default_value = "plotter.toml")]
    config: PathBuf,

    /// Time steps against the wall clock instead of the simulated one
    #[arg(long)]
    realtime: bool,

    /// Print the final plotter status as JSON
    #[arg(long)]
    status_json: bool,
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    tracing::info!("Starting wallplot-rs plotter host");

    let config = read_config(&args.config)?;
    tracing::info!(
        "Geometry: anchors {} mm apart at y={} mm, {:.5} mm/step",
        config.machine.anchor_separation,
        config.machine.anchor_height,
        config.machine.mm_per_step()
    );
    tracing::info!(
        "Motors: {} steps/s, {} steps/s², {:?} segments",
        config.motors.speed,
        config.motors.acceleration,
        config.motion.segment_mode
    );

    let program = std::fs::read_to_string(&args.program).map_err(|e| {
        tracing::error!("Failed to read program '{}': {}", args.program.display(), e);
        Box::new(e) as BoxError
    })?;

    let (report, status) = if args.realtime {
        draw(&config, StdClock::new(), &program)
    } else {
        let clock = SimClock::new();
        let result = draw(&config, &clock, &program);
        tracing::info!("Simulated drawing time: {:.3} s", clock.elapsed().as_secs_f64());
        result
    };

    tracing::info!(
        "Program finished: {} executed, {} ignored, {} failed; steps m1={} m2={}",
        report.executed,
        report.ignored,
        report.failed,
        status.total_steps[0],
        status.total_steps[1]
    );

    if args.status_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    }

    Ok(())
}

fn read_config(path: &Path) -> Result<Config, BoxError> {
    if !path.exists() {
        tracing::warn!("Config file '{}' not found, using defaults", path.display());
        return Ok(Config::default());
    }
    tracing::info!("Loading configuration from: {}", path.display());
    load_config(&path.to_string_lossy()).map_err(|e| {
        tracing::error!("Please ensure the configuration file is properly formatted");
        Box::new(e) as BoxError
    })
}

fn draw<T: TimeInterface>(config: &Config, clock: T, program: &str) -> (ProgramReport, PlotterStatus) {
    let drivers = [
        UnipolarCoils::new(TracingPins::new("m1")),
        UnipolarCoils::new(TracingPins::new("m2")),
    ];
    let mut plotter = Plotter::new(config, drivers, clock);
    let report = GCodeExecutor::new(&mut plotter).run(program);
    plotter.disable_motors();
    (report, plotter.status())
}
