//! Adaptive Dormand-Prince 8(5,3) integrator
//!
//! Presents a fixed external step (`advance(dt)`) while internally choosing
//! substep sizes to keep the local error within `rtol`/`atol`. The error
//! estimate blends the embedded 5th- and 3rd-order solutions:
//!
//! ```text
//! err5 = h * sum(E5[s] * k[s]) / scale      scale = atol + rtol * max(|y|, |y_new|)
//! err3 = h * sum(E3[s] * k[s]) / scale
//! err  = |err5|^2 / sqrt((|err5|^2 + 0.01 |err3|^2) * n)
//! ```
//!
//! A step is accepted when `err < 1`; the next step size scales by
//! `SAFETY * err^(-1/8)`, clamped to `[MIN_FACTOR, MAX_FACTOR]`.

use serde::{Deserialize, Serialize};

use super::model::PhysicsModel;
use super::state::{State, positive};
use crate::consts::{ATOL, MAX_SUBSTEPS, RTOL};
use crate::error::SimError;

const N: usize = 4;
type Vector = [f64; N];

const STAGES: usize = 12;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// -1 / (error estimator order + 1)
const ERROR_EXPONENT: f64 = -1.0 / 8.0;

const C: [f64; STAGES] = [
    0.0,
    0.05260015195876773,
    0.0789002279381516,
    0.1183503419072274,
    0.2816496580927726,
    0.3333333333333333,
    0.25,
    0.3076923076923077,
    0.6512820512820513,
    0.6,
    0.8571428571428571,
    1.0,
];

#[rustfmt::skip]
const A: [[f64; STAGES]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.05260015195876773, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0197250569845379, 0.0591751709536137, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.02958758547680685, 0.0, 0.08876275643042054, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.2413651341592667, 0.0, -0.8845494793282861, 0.924834003261792, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.037037037037037035, 0.0, 0.0, 0.17082860872947386, 0.12546768756682242, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.037109375, 0.0, 0.0, 0.17025221101954405, 0.06021653898045596, -0.017578125, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.03709200011850479, 0.0, 0.0, 0.17038392571223998, 0.10726203044637328, -0.015319437748624402, 0.008273789163814023, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.6241109587160757, 0.0, 0.0, -3.3608926294469414, -0.868219346841726, 27.59209969944671, 20.154067550477894, -43.48988418106996, 0.0, 0.0, 0.0, 0.0],
    [0.47766253643826434, 0.0, 0.0, -2.4881146199716677, -0.590290826836843, 21.230051448181193, 15.279233632882423, -33.28821096898486, -0.020331201708508627, 0.0, 0.0, 0.0],
    [-0.9371424300859873, 0.0, 0.0, 5.186372428844064, 1.0914373489967295, -8.149787010746927, -18.52006565999696, 22.739487099350505, 2.4936055526796523, -3.0467644718982196, 0.0, 0.0],
    [2.273310147516538, 0.0, 0.0, -10.53449546673725, -2.0008720582248625, -17.9589318631188, 27.94888452941996, -2.8589982771350235, -8.87285693353063, 12.360567175794303, 0.6433927460157636, 0.0],
];

const B: [f64; STAGES] = [
    0.054293734116568765,
    0.0,
    0.0,
    0.0,
    0.0,
    4.450312892752409,
    1.8915178993145003,
    -5.801203960010585,
    0.3111643669578199,
    -0.1521609496625161,
    0.20136540080403034,
    0.04471061572777259,
];

/// 5th-order error weights, relative to B
const E5: [f64; STAGES] = [
    0.01312004499419488,
    0.0,
    0.0,
    0.0,
    0.0,
    -1.2251564463762044,
    -0.4957589496572502,
    1.6643771824549864,
    -0.35032884874997366,
    0.3341791187130175,
    0.08192320648511571,
    -0.022355307863886294,
];

/// 3rd-order error weights, relative to B
const E3: [f64; STAGES] = [
    -0.18980075407240762,
    0.0,
    0.0,
    0.0,
    0.0,
    4.450312892752409,
    1.8915178993145003,
    -5.801203960010585,
    -0.4226823213237919,
    -0.1521609496625161,
    0.20136540080403034,
    0.02265179219836082,
];

/// Tolerances and termination bound for one integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Relative tolerance
    pub rtol: f64,
    /// Absolute tolerance
    pub atol: f64,
    /// Maximum substep attempts (accepted + rejected) per `advance`
    pub max_substeps: u32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            rtol: RTOL,
            atol: ATOL,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl IntegratorConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        positive("integrator.rtol", self.rtol)?;
        positive("integrator.atol", self.atol)?;
        if self.max_substeps == 0 {
            return Err(SimError::invalid("integrator.max_substeps", "must be >= 1"));
        }
        Ok(())
    }
}

/// Re-seedable adaptive integrator.
///
/// Holds the current `(t, y)` pair and the step size suggested by the last
/// accepted substep. [`Dop853::reseed`] discards that history so integration
/// restarts cleanly after an externally forced correction.
#[derive(Debug, Clone)]
pub struct Dop853 {
    config: IntegratorConfig,
    t: f64,
    y: Vector,
    /// Suggested next substep, `None` until the first step after a (re)seed
    h: Option<f64>,
    last_substeps: u32,
}

impl Dop853 {
    pub fn new(config: IntegratorConfig, state: State, t: f64) -> Self {
        Self {
            config,
            t,
            y: state.to_array(),
            h: None,
            last_substeps: 0,
        }
    }

    /// Restart from `(state, t)`, dropping all step-size history
    pub fn reseed(&mut self, state: State, t: f64) {
        self.t = t;
        self.y = state.to_array();
        self.h = None;
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn state(&self) -> State {
        State::from_array(self.y)
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Substep attempts used by the most recent `advance`
    pub fn last_substeps(&self) -> u32 {
        self.last_substeps
    }

    /// Integrate from the seeded time to `t + dt` and return the new state.
    ///
    /// The integrator's own `(t, y)` moves to the result; callers that reject
    /// the result must [`reseed`](Self::reseed).
    pub fn advance<M: PhysicsModel>(&mut self, model: &M, dt: f64) -> Result<State, SimError> {
        let t_end = self.t + dt;
        self.integrate_to(model, t_end)
    }

    pub fn integrate_to<M: PhysicsModel>(
        &mut self,
        model: &M,
        t_end: f64,
    ) -> Result<State, SimError> {
        let mut t = self.t;
        let mut y = self.y;
        self.last_substeps = 0;
        if t_end <= t {
            return Ok(State::from_array(y));
        }

        let mut h = match self.h {
            Some(h) => h,
            None => {
                let f0 = eval(model, t, &y)?;
                self.initial_step(model, t, &y, &f0)?
            }
        };

        let mut attempts = 0;
        let mut rejected = false;
        while t < t_end {
            if attempts >= self.config.max_substeps {
                return Err(SimError::SubstepLimit {
                    limit: self.config.max_substeps,
                    t,
                });
            }
            attempts += 1;

            let remaining = t_end - t;
            let last = h >= remaining;
            if !last && !(h > 0.0 && h >= 10.0 * f64::EPSILON * t.abs()) {
                return Err(SimError::StepSizeUnderflow { t, h });
            }
            let h_try = if last { remaining } else { h };

            let (y_new, err) = self.try_step(model, t, &y, h_try)?;
            if err < 1.0 {
                let mut factor = if err == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                };
                if rejected {
                    factor = factor.min(1.0);
                }
                t = if last { t_end } else { t + h_try };
                y = y_new;
                h = h_try * factor;
                rejected = false;
            } else {
                h = h_try * (SAFETY * err.powf(ERROR_EXPONENT)).max(MIN_FACTOR);
                rejected = true;
            }
        }

        log::trace!("advanced to t={t_end} in {attempts} substeps (next h={h:e})");
        self.t = t_end;
        self.y = y;
        self.h = Some(h);
        self.last_substeps = attempts;
        Ok(State::from_array(y))
    }

    /// One trial substep; returns the 8th-order solution and its scaled error
    fn try_step<M: PhysicsModel>(
        &self,
        model: &M,
        t: f64,
        y: &Vector,
        h: f64,
    ) -> Result<(Vector, f64), SimError> {
        let mut k = [[0.0; N]; STAGES];
        for s in 0..STAGES {
            let mut ys = *y;
            for (a, kj) in A[s].iter().zip(&k).take(s) {
                if *a != 0.0 {
                    for i in 0..N {
                        ys[i] += h * a * kj[i];
                    }
                }
            }
            k[s] = eval(model, t + C[s] * h, &ys)?;
        }

        let mut y_new = *y;
        let mut err5 = [0.0; N];
        let mut err3 = [0.0; N];
        for s in 0..STAGES {
            for i in 0..N {
                y_new[i] += h * B[s] * k[s][i];
                err5[i] += E5[s] * k[s][i];
                err3[i] += E3[s] * k[s][i];
            }
        }
        if !y_new.iter().all(|v| v.is_finite()) {
            return Err(SimError::NumericalDivergence { t: t + h });
        }

        let mut norm5 = 0.0;
        let mut norm3 = 0.0;
        for i in 0..N {
            let scale = self.config.atol + y[i].abs().max(y_new[i].abs()) * self.config.rtol;
            norm5 += (err5[i] / scale).powi(2);
            norm3 += (err3[i] / scale).powi(2);
        }
        let err = if norm5 == 0.0 && norm3 == 0.0 {
            0.0
        } else {
            h.abs() * norm5 / ((norm5 + 0.01 * norm3) * N as f64).sqrt()
        };
        Ok((y_new, err))
    }

    /// Starting step size (Hairer's heuristic)
    fn initial_step<M: PhysicsModel>(
        &self,
        model: &M,
        t: f64,
        y: &Vector,
        f0: &Vector,
    ) -> Result<f64, SimError> {
        let scale = y.map(|v| self.config.atol + v.abs() * self.config.rtol);
        let d0 = rms(|i| y[i] / scale[i]);
        let d1 = rms(|i| f0[i] / scale[i]);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };

        let y1: Vector = std::array::from_fn(|i| y[i] + h0 * f0[i]);
        let f1 = eval(model, t + h0, &y1)?;
        let d2 = rms(|i| (f1[i] - f0[i]) / scale[i]) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(-ERROR_EXPONENT)
        };
        Ok((100.0 * h0).min(h1))
    }
}

/// Evaluate the model, rejecting non-finite derivatives
#[inline]
fn eval<M: PhysicsModel>(model: &M, t: f64, y: &Vector) -> Result<Vector, SimError> {
    let d = model.derivative(t, y);
    if d.iter().all(|v| v.is_finite()) {
        Ok(d)
    } else {
        Err(SimError::NumericalDivergence { t })
    }
}

#[inline]
fn rms(f: impl Fn(usize) -> f64) -> f64 {
    ((0..N).map(|i| f(i).powi(2)).sum::<f64>() / N as f64).sqrt()
}
