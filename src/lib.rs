//! Hoopsim - a 2D basketball projectile simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics model, integrator, collisions)
//! - `runner`: Run-to-completion policy for hosts
//! - `settings`: JSON configuration
//! - `view`: Simulation-to-screen coordinate mapping
//! - `error`: Error types

pub mod error;
pub mod runner;
pub mod settings;
pub mod sim;
pub mod view;

pub use error::{SettingsError, SimError};
pub use runner::{RunLimits, RunReport, StopReason, run};
pub use settings::Settings;

use glam::DVec2;

/// Default scenario constants
pub mod consts {
    /// Fixed external simulation timestep (seconds)
    pub const SIM_DT: f64 = 0.1;

    /// Launch defaults
    pub const LAUNCH_SPEED: f64 = 81.0;
    pub const LAUNCH_ANGLE_DEG: f64 = 70.0;
    pub const START_X: f64 = 60.0;
    pub const START_Y: f64 = 270.0;

    /// Physical defaults
    pub const DRAG_COEFFICIENT: f64 = 0.0001;
    pub const GRAVITY: f64 = 9.8;
    pub const MASS: f64 = 1.0;
    /// Fraction of speed kept by the reflected velocity component on impact
    pub const RESTITUTION: f64 = 0.2;

    /// Court layout
    pub const FLOOR_Y: f64 = 200.0;
    pub const BACKBOARD_X: f64 = 455.0;
    pub const BACKBOARD_TOP_Y: f64 = 570.0;
    pub const RIM_X_MIN: f64 = 400.0;
    pub const RIM_X_MAX: f64 = 410.0;
    pub const RIM_Y: f64 = 455.0;

    /// Phase offsets applied to the impact angle (radians)
    pub const BACKBOARD_PHASE: f64 = 2.355;
    pub const HORIZONTAL_SURFACE_PHASE: f64 = 0.785;

    /// Adaptive integrator defaults
    pub const RTOL: f64 = 1e-6;
    pub const ATOL: f64 = 1e-12;
    pub const MAX_SUBSTEPS: u32 = 500;
}

/// Convert a launch speed and angle (degrees above +x) to a velocity vector
#[inline]
pub fn launch_velocity(speed: f64, angle_deg: f64) -> DVec2 {
    let theta = angle_deg.to_radians();
    DVec2::new(speed * theta.cos(), speed * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_velocity_components() {
        let v = launch_velocity(10.0, 0.0);
        assert!((v.x - 10.0).abs() < 1e-12);
        assert!(v.y.abs() < 1e-12);

        let v = launch_velocity(10.0, 90.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 10.0).abs() < 1e-12);

        let v = launch_velocity(consts::LAUNCH_SPEED, consts::LAUNCH_ANGLE_DEG);
        assert!((v.length() - consts::LAUNCH_SPEED).abs() < 1e-9);
    }
}
