//! Hoopsim entry point
//!
//! Headless host: loads settings, runs one shot to completion and prints the
//! run report, the shot's range and its trajectory as JSON on stdout.
//!
//! Usage: `hoopsim [SETTINGS.json] [--screen]`

use std::process::ExitCode;

use glam::DVec2;
use serde::Serialize;

use hoopsim::sim::Simulation;
use hoopsim::{RunReport, Settings, run};

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    report: RunReport,
    /// Final horizontal position, in simulation coordinates
    range: Option<f64>,
    trajectory: &'a [DVec2],
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Hoopsim starting...");

    let mut path = None;
    let mut screen = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--screen" => screen = true,
            _ if path.is_none() => path = Some(arg),
            _ => {
                eprintln!("usage: hoopsim [SETTINGS.json] [--screen]");
                return ExitCode::from(2);
            }
        }
    }

    match run_shot(path.as_deref(), screen) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("hoopsim: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_shot(path: Option<&str>, screen: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => {
            log::info!("Using default settings");
            Settings::default()
        }
    };

    let mut sim = Simulation::with_geometry(settings.params.clone(), settings.geometry)?;
    sim.resume();
    let report = run(&mut sim, &settings.limits)?;
    sim.pause();

    let points: Vec<DVec2> = if screen {
        sim.trajectory()
            .iter()
            .map(|p| settings.view.sim_to_screen(*p))
            .collect()
    } else {
        sim.trajectory().points().to_vec()
    };

    let output = Output {
        report,
        range: sim.trajectory().range(),
        trajectory: &points,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
