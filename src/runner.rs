//! Run-to-completion policy
//!
//! The simulation itself never ends; hosts decide when a run is over.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::{Simulation, StepOutcome};

/// When to stop stepping a simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    /// Simulated seconds before giving up
    pub max_time: f64,
    /// Bounces in a row (time frozen) before the run counts as stalled
    pub max_consecutive_bounces: u32,
    /// Speed below which a ball near the floor is at rest
    pub rest_speed: f64,
    /// Height above the floor that still counts as "on the floor"
    pub rest_height: f64,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_time: 60.0,
            max_consecutive_bounces: 32,
            rest_speed: 0.5,
            rest_height: 1.0,
        }
    }
}

impl RunLimits {
    pub fn validate(&self) -> Result<(), SimError> {
        crate::sim::state::positive("limits.max_time", self.max_time)?;
        if self.max_consecutive_bounces == 0 {
            return Err(SimError::invalid(
                "limits.max_consecutive_bounces",
                "must be >= 1",
            ));
        }
        for (field, value) in [
            ("limits.rest_speed", self.rest_speed),
            ("limits.rest_height", self.rest_height),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::invalid(
                    field,
                    format!("must be finite and >= 0, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TimeLimit,
    AtRest,
    /// Bounces kept repeating without time advancing
    Stalled,
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub stop_reason: StopReason,
    pub time: f64,
    pub steps: u64,
    pub bounces: u64,
}

/// Step `sim` until one of `limits` triggers
pub fn run(sim: &mut Simulation, limits: &RunLimits) -> Result<RunReport, SimError> {
    let floor_y = sim.geometry().floor_y;
    let mut steps = 0;
    let mut bounces = 0;
    let mut consecutive = 0;

    log::info!("run started (max_time={}s)", limits.max_time);
    let stop_reason = loop {
        if sim.time() >= limits.max_time {
            break StopReason::TimeLimit;
        }

        steps += 1;
        match sim.step()? {
            StepOutcome::Accepted => {
                consecutive = 0;
                let state = sim.current_state();
                if state.speed() < limits.rest_speed
                    && state.pos.y - floor_y <= limits.rest_height
                {
                    break StopReason::AtRest;
                }
            }
            StepOutcome::Bounced(_) => {
                bounces += 1;
                consecutive += 1;
                if consecutive >= limits.max_consecutive_bounces {
                    log::warn!(
                        "run stalled at t={:.3}: {consecutive} bounces without progress",
                        sim.time()
                    );
                    break StopReason::Stalled;
                }
            }
        }
    };

    let report = RunReport {
        stop_reason,
        time: sim.time(),
        steps,
        bounces,
    };
    log::info!(
        "run finished: {:?} at t={:.3} after {} steps ({} bounces)",
        report.stop_reason,
        report.time,
        report.steps,
        report.bounces
    );
    Ok(report)
}
