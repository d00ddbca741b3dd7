//! Collision detection and response against static court geometry
//!
//! Detection looks only at the candidate position. Response rewinds to the
//! previous (last valid) position and rewrites one velocity component from
//! the previous velocity:
//!
//! ```text
//! backboard:   vx' = k * |v| * cos(angle + 2.355)     vy' = vy
//! rim / floor: vy' = k * |v| * sin(angle + 0.785)     vx' = vx
//! ```

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::state::{Geometry, SimulationParams, State};
use crate::consts::{BACKBOARD_PHASE, HORIZONTAL_SURFACE_PHASE};

/// Static obstacles, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Obstacle {
    Backboard,
    Rim,
    Floor,
}

/// How the impact angle is derived from the incoming velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactAngle {
    /// `atan2(vy, vx)`.
    ///
    /// A falling ball keeps a downward vy after a floor bounce, so it stays
    /// pinned to the floor.
    Atan2,
    /// `atan(vx / vy)` reinterpreted as degrees and converted to radians.
    ///
    /// The angle stays near zero, so rim and floor bounces send the ball back
    /// up. Undefined (NaN) when the incoming velocity is zero.
    #[default]
    SourceLiteral,
}

impl ImpactAngle {
    pub fn angle(self, vel: DVec2) -> f64 {
        match self {
            ImpactAngle::Atan2 => vel.y.atan2(vel.x),
            ImpactAngle::SourceLiteral => (vel.x / vel.y).atan().to_radians(),
        }
    }
}

/// Outcome of checking a candidate state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// No contact; the candidate may be committed
    Accept,
    /// Contact; commit `state` instead of the candidate
    Bounce { obstacle: Obstacle, state: State },
}

/// Checks candidate states against fixed geometry
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    geometry: Geometry,
    restitution: f64,
    impact_angle: ImpactAngle,
}

impl CollisionResolver {
    pub fn new(geometry: Geometry, restitution: f64, impact_angle: ImpactAngle) -> Self {
        Self {
            geometry,
            restitution,
            impact_angle,
        }
    }

    pub fn from_params(params: &SimulationParams, geometry: Geometry) -> Self {
        Self::new(geometry, params.restitution, params.impact_angle)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// First obstacle containing `pos`, checked backboard, rim, then floor
    pub fn obstacle_at(&self, pos: DVec2) -> Option<Obstacle> {
        let g = &self.geometry;
        if pos.x >= g.backboard_x && pos.y <= g.backboard_top_y {
            Some(Obstacle::Backboard)
        } else if (g.rim_x_min..=g.rim_x_max).contains(&pos.x) && pos.y <= g.rim_y {
            Some(Obstacle::Rim)
        } else if pos.y <= g.floor_y {
            Some(Obstacle::Floor)
        } else {
            None
        }
    }

    pub fn check(&self, candidate: &State, previous: &State) -> Resolution {
        match self.obstacle_at(candidate.pos) {
            None => Resolution::Accept,
            Some(obstacle) => Resolution::Bounce {
                obstacle,
                state: self.bounce(obstacle, previous),
            },
        }
    }

    /// Post-impact state computed from the last valid state
    pub fn bounce(&self, obstacle: Obstacle, previous: &State) -> State {
        let angle = self.impact_angle.angle(previous.vel);
        let speed = previous.vel.length();
        let retained = self.restitution * speed;

        let vel = match obstacle {
            Obstacle::Backboard => {
                DVec2::new(retained * (angle + BACKBOARD_PHASE).cos(), previous.vel.y)
            }
            Obstacle::Rim | Obstacle::Floor => DVec2::new(
                previous.vel.x,
                retained * (angle + HORIZONTAL_SURFACE_PHASE).sin(),
            ),
        };
        State::new(previous.pos, vel)
    }
}
