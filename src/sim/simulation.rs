//! Fixed-step simulation driver
//!
//! Each step proposes the state at `t + dt`, lets the collision resolver
//! accept or override it, and commits the result:
//! - Accept: state committed, `t += dt`, position appended to the trajectory
//! - Bounce: bounced state committed at the same `t`, integrator reseeded

use serde::{Deserialize, Serialize};

use super::collision::{CollisionResolver, Obstacle, Resolution};
use super::integrator::Dop853;
use super::model::LinearDrag;
use super::state::{Geometry, SimulationParams, State, Trajectory};
use crate::error::SimError;

/// Run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Paused,
    Running,
}

/// Result of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Candidate committed and time advanced
    Accepted,
    /// Candidate discarded in favour of a post-impact state; time unchanged
    Bounced(Obstacle),
}

/// Ball simulation over a static court
#[derive(Debug, Clone)]
pub struct Simulation {
    params: SimulationParams,
    model: LinearDrag,
    integrator: Dop853,
    resolver: CollisionResolver,
    state: State,
    t: f64,
    trajectory: Trajectory,
    mode: Mode,
}

impl Simulation {
    /// Create a paused simulation on the default court
    pub fn new(params: SimulationParams) -> Result<Self, SimError> {
        Self::with_geometry(params, Geometry::default())
    }

    pub fn with_geometry(params: SimulationParams, geometry: Geometry) -> Result<Self, SimError> {
        params.validate()?;
        geometry.validate()?;

        let state = params.initial_state();
        log::debug!(
            "new simulation: start={:?} vel={:?} dt={}",
            state.pos,
            state.vel,
            params.dt
        );
        Ok(Self {
            model: LinearDrag::from_params(&params),
            integrator: Dop853::new(params.integrator, state, 0.0),
            resolver: CollisionResolver::from_params(&params, geometry),
            trajectory: Trajectory::starting_at(state.pos),
            state,
            t: 0.0,
            mode: Mode::Paused,
            params,
        })
    }

    /// Advance by one external step, regardless of mode.
    ///
    /// On error nothing is committed.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        let candidate = match self.integrator.advance(&self.model, self.params.dt) {
            Ok(candidate) => candidate,
            Err(err) => {
                // Keep the integrator consistent with the committed state
                self.integrator.reseed(self.state, self.t);
                return Err(err);
            }
        };

        match self.resolver.check(&candidate, &self.state) {
            Resolution::Accept => {
                self.state = candidate;
                self.t += self.params.dt;
                self.trajectory.push(candidate.pos);
                Ok(StepOutcome::Accepted)
            }
            Resolution::Bounce { obstacle, state } => {
                if !state.is_finite() {
                    log::warn!(
                        "non-finite bounce off {obstacle:?} at t={:.3} from vel {:?}",
                        self.t,
                        self.state.vel
                    );
                    self.integrator.reseed(self.state, self.t);
                    return Err(SimError::NumericalDivergence { t: self.t });
                }
                log::debug!(
                    "bounce off {obstacle:?} at t={:.3}: vel {:?} -> {:?}",
                    self.t,
                    self.state.vel,
                    state.vel
                );
                self.state = state;
                self.integrator.reseed(state, self.t);
                Ok(StepOutcome::Bounced(obstacle))
            }
        }
    }

    /// Per-frame entry point: steps only while running
    pub fn tick(&mut self) -> Result<Option<StepOutcome>, SimError> {
        match self.mode {
            Mode::Paused => Ok(None),
            Mode::Running => self.step().map(Some),
        }
    }

    pub fn pause(&mut self) {
        self.mode = Mode::Paused;
    }

    pub fn resume(&mut self) {
        self.mode = Mode::Running;
    }

    pub fn is_paused(&self) -> bool {
        self.mode == Mode::Paused
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn current_state(&self) -> State {
        self.state
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn geometry(&self) -> &Geometry {
        self.resolver.geometry()
    }

    /// Substep attempts used by the last integrator advance
    pub fn last_substeps(&self) -> u32 {
        self.integrator.last_substeps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::ImpactAngle;
    use glam::DVec2;

    #[test]
    fn test_starts_paused_with_initial_point() {
        let sim = Simulation::new(SimulationParams::default()).unwrap();
        assert!(sim.is_paused());
        assert_eq!(sim.mode(), Mode::Paused);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.trajectory().points(), &[DVec2::new(60.0, 270.0)]);
    }

    #[test]
    fn test_invalid_params_rejected_at_construction() {
        let params = SimulationParams {
            mass: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(params),
            Err(SimError::InvalidParams { field: "mass", .. })
        ));

        let geometry = Geometry {
            floor_y: f64::INFINITY,
            ..Default::default()
        };
        assert!(Simulation::with_geometry(SimulationParams::default(), geometry).is_err());
    }

    #[test]
    fn test_pause_resume_idempotent() {
        let mut sim = Simulation::new(SimulationParams::default()).unwrap();
        sim.step().unwrap();
        let state = sim.current_state();
        let trajectory = sim.trajectory().clone();

        sim.pause();
        sim.pause();
        assert!(sim.is_paused());
        sim.resume();
        sim.resume();
        assert!(!sim.is_paused());
        sim.pause();

        assert_eq!(sim.current_state(), state);
        assert_eq!(sim.trajectory(), &trajectory);
    }

    #[test]
    fn test_tick_only_steps_while_running() {
        let mut sim = Simulation::new(SimulationParams::default()).unwrap();
        assert_eq!(sim.tick().unwrap(), None);
        assert_eq!(sim.trajectory().len(), 1);

        sim.resume();
        assert_eq!(sim.tick().unwrap(), Some(StepOutcome::Accepted));
        assert_eq!(sim.trajectory().len(), 2);
    }

    #[test]
    fn test_manual_step_while_paused() {
        let mut sim = Simulation::new(SimulationParams::default()).unwrap();
        assert_eq!(sim.step().unwrap(), StepOutcome::Accepted);
        assert!(sim.is_paused());
        assert!((sim.time() - 0.1).abs() < 1e-12);
        assert_eq!(sim.trajectory().last(), Some(sim.current_state().pos));
    }

    #[test]
    fn test_default_scenario_first_contact_is_rim() {
        let mut sim = Simulation::new(SimulationParams::default()).unwrap();
        let mut last_accepted = sim.current_state();

        for _ in 0..1000 {
            match sim.step().unwrap() {
                StepOutcome::Accepted => last_accepted = sim.current_state(),
                StepOutcome::Bounced(obstacle) => {
                    assert_eq!(obstacle, Obstacle::Rim);
                    assert_eq!(sim.current_state().pos, last_accepted.pos);
                    assert!((sim.time() - 12.5).abs() < 1e-6, "t = {}", sim.time());
                    assert_eq!(sim.trajectory().last(), Some(last_accepted.pos));
                    return;
                }
            }
        }
        panic!("no contact within 1000 steps");
    }

    #[test]
    fn test_default_scenario_bounces_back_up() {
        let mut sim = Simulation::new(SimulationParams::default()).unwrap();
        let mut contacts = Vec::new();

        for _ in 0..1000 {
            if let StepOutcome::Bounced(obstacle) = sim.step().unwrap() {
                contacts.push(obstacle);
                if obstacle != Obstacle::Backboard {
                    assert!(
                        sim.current_state().vel.y > 0.0,
                        "{obstacle:?} at t={}",
                        sim.time()
                    );
                }
                if obstacle == Obstacle::Floor {
                    break;
                }
            }
        }
        assert_eq!(contacts, [Obstacle::Rim, Obstacle::Backboard, Obstacle::Floor]);

        // Off the floor the ball flies again and time moves on
        let t = sim.time();
        assert_eq!(sim.step().unwrap(), StepOutcome::Accepted);
        assert!(sim.time() > t);
        assert!(sim.current_state().pos.y > sim.geometry().floor_y);
    }

    #[test]
    fn test_bounce_keeps_time_and_trajectory() {
        // Launch straight down onto the floor
        let params = SimulationParams {
            start: DVec2::new(100.0, 201.0),
            launch_speed: 50.0,
            launch_angle_deg: -90.0,
            ..Default::default()
        };
        let mut sim = Simulation::new(params).unwrap();
        let before = sim.current_state();

        assert_eq!(sim.step().unwrap(), StepOutcome::Bounced(Obstacle::Floor));
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.trajectory().len(), 1);
        assert_eq!(sim.current_state().pos, before.pos);
        assert!(sim.current_state().speed() <= before.speed());
    }

    #[test]
    fn test_bounce_reseeds_integrator() {
        let params = SimulationParams {
            start: DVec2::new(100.0, 201.0),
            launch_speed: 50.0,
            launch_angle_deg: -90.0,
            impact_angle: ImpactAngle::SourceLiteral,
            ..Default::default()
        };
        let mut sim = Simulation::new(params).unwrap();
        sim.step().unwrap();
        let bounced = sim.current_state();
        assert!(bounced.vel.y > 0.0);

        // Next step integrates from the bounced state, not the discarded candidate
        assert_eq!(sim.step().unwrap(), StepOutcome::Accepted);
        let state = sim.current_state();
        let expected_y = bounced.pos.y + bounced.vel.y * 0.1 - 0.5 * 9.8 * 0.01;
        assert!((state.pos.y - expected_y).abs() < 1e-6);
    }

    #[test]
    fn test_divergence_leaves_state_untouched() {
        let params = SimulationParams {
            launch_speed: 1e308,
            ..Default::default()
        };
        let mut sim = Simulation::new(params).unwrap();
        let before = sim.current_state();
        let err = sim.step().unwrap_err();
        assert!(
            matches!(
                err,
                SimError::NumericalDivergence { .. }
                    | SimError::StepSizeUnderflow { .. }
                    | SimError::SubstepLimit { .. }
            ),
            "unexpected error: {err:?}"
        );
        assert_eq!(sim.current_state(), before);
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn test_bounce_from_rest_is_divergence() {
        // Dropped from rest with no restitution: the ball ends up on the floor
        // with zero velocity, where atan(0 / 0) has no defined value
        let params = SimulationParams {
            start: DVec2::new(100.0, 201.0),
            launch_speed: 0.0,
            launch_angle_deg: 90.0,
            restitution: 0.0,
            impact_angle: ImpactAngle::SourceLiteral,
            ..Default::default()
        };
        let mut sim = Simulation::new(params).unwrap();

        for _ in 0..200 {
            let (state, t, len) = (sim.current_state(), sim.time(), sim.trajectory().len());
            match sim.step() {
                Ok(_) => assert!(sim.current_state().is_finite()),
                Err(err) => {
                    assert!(matches!(err, SimError::NumericalDivergence { .. }), "{err:?}");
                    assert_eq!(sim.current_state(), state);
                    assert!(sim.current_state().is_finite());
                    assert_eq!(sim.time(), t);
                    assert_eq!(sim.trajectory().len(), len);

                    // Retrying hits the same contact again without committing anything
                    assert!(sim.step().is_err());
                    assert_eq!(sim.current_state(), state);
                    assert_eq!(sim.time(), t);
                    return;
                }
            }
        }
        panic!("resting contact never reported");
    }

    #[test]
    fn test_params_accessor_returns_construction_params() {
        let params = SimulationParams {
            launch_speed: 42.0,
            restitution: 0.5,
            ..Default::default()
        };
        let sim = Simulation::new(params.clone()).unwrap();
        assert_eq!(sim.params(), &params);
        assert_eq!(sim.geometry(), &Geometry::default());
    }

    #[test]
    fn test_identical_runs_are_identical() {
        let run = || {
            let mut sim = Simulation::new(SimulationParams::default()).unwrap();
            for _ in 0..300 {
                sim.step().unwrap();
            }
            (sim.trajectory().clone(), sim.current_state(), sim.time())
        };
        assert_eq!(run(), run());
    }
}
