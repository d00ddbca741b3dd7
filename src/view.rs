//! Simulation-to-screen mapping for presentation hosts
//!
//! Screen space has y growing downward; simulation space has y up.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Window layout used to map simulation coordinates to pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub win_width: f64,
    pub win_height: f64,
    /// Offset applied to both axes before flipping y
    pub margin: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            win_width: 640.0,
            win_height: 640.0,
            margin: 10.0,
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        crate::sim::state::positive("view.win_width", self.win_width)?;
        crate::sim::state::positive("view.win_height", self.win_height)?;
        if !self.margin.is_finite() {
            return Err(SimError::invalid("view.margin", "must be finite"));
        }
        Ok(())
    }

    /// Map a simulation point to screen pixels
    #[inline]
    pub fn sim_to_screen(&self, pos: DVec2) -> DVec2 {
        DVec2::new(pos.x + self.margin, self.win_height - (pos.y + self.margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_and_offset() {
        let view = ViewConfig::default();
        assert_eq!(view.sim_to_screen(DVec2::new(60.0, 270.0)), DVec2::new(70.0, 360.0));
        // Higher in the world is closer to the top of the screen
        let low = view.sim_to_screen(DVec2::new(0.0, 100.0));
        let high = view.sim_to_screen(DVec2::new(0.0, 500.0));
        assert!(high.y < low.y);
    }
}
