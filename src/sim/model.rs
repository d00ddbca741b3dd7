//! Equations of motion
//!
//! The state vector is (x, y, vx, vy); its derivative is (vx, vy, ax, ay).

use super::state::SimulationParams;

/// Right-hand side of the ODE advanced by the integrator
pub trait PhysicsModel {
    /// Time derivative of `state` at time `t`
    fn derivative(&self, t: f64, state: &[f64; 4]) -> [f64; 4];
}

/// Gravity plus linear drag on the horizontal axis.
///
/// Drag acts on vx only; the vertical axis feels gravity alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDrag {
    pub drag: f64,
    pub gravity: f64,
    pub mass: f64,
}

impl LinearDrag {
    pub fn new(drag: f64, gravity: f64, mass: f64) -> Self {
        Self {
            drag,
            gravity,
            mass,
        }
    }

    pub fn from_params(params: &SimulationParams) -> Self {
        Self::new(params.drag, params.gravity, params.mass)
    }
}

impl PhysicsModel for LinearDrag {
    #[inline]
    fn derivative(&self, _t: f64, state: &[f64; 4]) -> [f64; 4] {
        let [_, _, vx, vy] = *state;
        [vx, vy, -self.drag * vx / self.mass, -self.gravity / self.mass]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_components() {
        let model = LinearDrag::new(0.5, 9.8, 2.0);
        let d = model.derivative(0.0, &[1.0, 2.0, 4.0, -3.0]);
        assert_eq!(d[0], 4.0);
        assert_eq!(d[1], -3.0);
        assert!((d[2] - (-1.0)).abs() < 1e-12);
        assert!((d[3] - (-4.9)).abs() < 1e-12);
    }

    #[test]
    fn test_drag_opposes_horizontal_motion_only() {
        let model = LinearDrag::new(0.1, 0.0, 1.0);
        let right = model.derivative(0.0, &[0.0, 0.0, 10.0, 50.0]);
        let left = model.derivative(0.0, &[0.0, 0.0, -10.0, 50.0]);
        assert!(right[2] < 0.0);
        assert!(left[2] > 0.0);
        // No vertical drag regardless of vy
        assert_eq!(right[3], 0.0);
    }

    #[test]
    fn test_time_invariant() {
        let model = LinearDrag::from_params(&SimulationParams::default());
        let s = [60.0, 270.0, 27.7, 76.1];
        assert_eq!(model.derivative(0.0, &s), model.derivative(123.4, &s));
    }
}
