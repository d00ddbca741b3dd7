//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed external timestep only
//! - No global state
//! - No rendering or platform dependencies

pub mod collision;
pub mod integrator;
pub mod model;
pub mod simulation;
pub mod state;

pub use collision::{CollisionResolver, ImpactAngle, Obstacle, Resolution};
pub use integrator::{Dop853, IntegratorConfig};
pub use model::{LinearDrag, PhysicsModel};
pub use simulation::{Mode, Simulation, StepOutcome};
pub use state::{Geometry, SimulationParams, State, Trajectory};
