//! Simulation state and parameter types
//!
//! Coordinates share one frame: x to the right, y up.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::ImpactAngle;
use super::integrator::IntegratorConfig;
use crate::consts::*;
use crate::error::SimError;
use crate::launch_velocity;

/// Ball state at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub pos: DVec2,
    pub vel: DVec2,
}

impl State {
    pub fn new(pos: DVec2, vel: DVec2) -> Self {
        Self { pos, vel }
    }

    /// State vector layout used by the integrator: (x, y, vx, vy)
    #[inline]
    pub fn to_array(self) -> [f64; 4] {
        [self.pos.x, self.pos.y, self.vel.x, self.vel.y]
    }

    #[inline]
    pub fn from_array(v: [f64; 4]) -> Self {
        Self {
            pos: DVec2::new(v[0], v[1]),
            vel: DVec2::new(v[2], v[3]),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }

    pub fn speed(&self) -> f64 {
        self.vel.length()
    }
}

/// Physical and numerical parameters for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Linear drag coefficient (gamma)
    pub drag: f64,
    /// Gravitational acceleration magnitude
    pub gravity: f64,
    pub mass: f64,
    /// External step size
    pub dt: f64,
    /// Velocity retention on impact, in [0, 1]
    pub restitution: f64,
    pub start: DVec2,
    pub launch_speed: f64,
    /// Launch angle in degrees above the +x axis
    pub launch_angle_deg: f64,
    /// Impact-angle law used by the bounce response
    pub impact_angle: ImpactAngle,
    pub integrator: IntegratorConfig,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            drag: DRAG_COEFFICIENT,
            gravity: GRAVITY,
            mass: MASS,
            dt: SIM_DT,
            restitution: RESTITUTION,
            start: DVec2::new(START_X, START_Y),
            launch_speed: LAUNCH_SPEED,
            launch_angle_deg: LAUNCH_ANGLE_DEG,
            impact_angle: ImpactAngle::default(),
            integrator: IntegratorConfig::default(),
        }
    }
}

impl SimulationParams {
    /// Reject parameters that cannot describe a run
    pub fn validate(&self) -> Result<(), SimError> {
        positive("mass", self.mass)?;
        positive("dt", self.dt)?;
        positive("gravity", self.gravity)?;
        if !(self.drag.is_finite() && self.drag >= 0.0) {
            return Err(SimError::invalid(
                "drag",
                format!("must be finite and >= 0, got {}", self.drag),
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::invalid(
                "restitution",
                format!("must lie in [0, 1], got {}", self.restitution),
            ));
        }
        if !self.start.is_finite() {
            return Err(SimError::invalid("start", "must be finite"));
        }
        if !self.launch_speed.is_finite() {
            return Err(SimError::invalid("launch_speed", "must be finite"));
        }
        if !self.launch_angle_deg.is_finite() {
            return Err(SimError::invalid("launch_angle_deg", "must be finite"));
        }
        self.integrator.validate()
    }

    /// Initial state from start position and launch speed/angle
    pub fn initial_state(&self) -> State {
        State::new(
            self.start,
            launch_velocity(self.launch_speed, self.launch_angle_deg),
        )
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!("must be finite and > 0, got {value}"),
        ))
    }
}

/// Static court obstacles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub floor_y: f64,
    /// Backboard front face; everything at or right of it is board
    pub backboard_x: f64,
    pub backboard_top_y: f64,
    pub rim_x_min: f64,
    pub rim_x_max: f64,
    pub rim_y: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            floor_y: FLOOR_Y,
            backboard_x: BACKBOARD_X,
            backboard_top_y: BACKBOARD_TOP_Y,
            rim_x_min: RIM_X_MIN,
            rim_x_max: RIM_X_MAX,
            rim_y: RIM_Y,
        }
    }
}

impl Geometry {
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("floor_y", self.floor_y),
            ("backboard_x", self.backboard_x),
            ("backboard_top_y", self.backboard_top_y),
            ("rim_x_min", self.rim_x_min),
            ("rim_x_max", self.rim_x_max),
            ("rim_y", self.rim_y),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(SimError::invalid(field, "must be finite"));
            }
        }
        if self.rim_x_min > self.rim_x_max {
            return Err(SimError::invalid(
                "rim_x_min",
                format!(
                    "must not exceed rim_x_max ({} > {})",
                    self.rim_x_min, self.rim_x_max
                ),
            ));
        }
        Ok(())
    }
}

/// Recorded positions of accepted steps (append-only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    points: Vec<DVec2>,
}

impl Trajectory {
    pub fn starting_at(pos: DVec2) -> Self {
        Self { points: vec![pos] }
    }

    pub(crate) fn push(&mut self, pos: DVec2) {
        self.points.push(pos);
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<DVec2> {
        self.points.last().copied()
    }

    /// Horizontal position of the last recorded point
    pub fn range(&self) -> Option<f64> {
        self.last().map(|p| p.x)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DVec2> {
        self.points.iter()
    }
}
