//! Animation phase counters and facing.
//!
//! The core only advances counters; the presentation layer picks sprites from
//! the mode, the phase and the facing key.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::math::Vec2;

/// Which animation loop a unit is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimMode {
    /// Standing still.
    #[default]
    Idle,
    /// Walking.
    Walk,
    /// Swinging at a target.
    Attack,
}

/// Animation phase state owned by each unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimState {
    /// Current loop.
    pub mode: AnimMode,
    /// Phase of the idle/walk loop.
    pub frame: f32,
    /// Phase of the attack loop.
    pub attack_frame: f32,
}

impl AnimState {
    /// Advance the phase of the current loop, wrapping at its frame count.
    pub fn advance(&mut self, dt_scale: f32, config: &SimConfig) {
        let step = config.anim_speed * dt_scale;
        match self.mode {
            AnimMode::Attack => {
                self.attack_frame = (self.attack_frame + step).rem_euclid(config.attack_frames);
            }
            AnimMode::Walk => {
                self.frame = (self.frame + step).rem_euclid(config.walk_frames);
            }
            AnimMode::Idle => {
                self.frame = (self.frame + step).rem_euclid(config.idle_frames);
            }
        }
    }
}

/// Compass directions in degrees, clockwise from north.
const DIRECTIONS: [u16; 16] = [
    0, 22, 45, 67, 90, 112, 135, 157, 180, 202, 225, 247, 270, 292, 315, 337,
];

/// One of 16 compass headings, 0 = north (screen up), clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facing(u16);

impl Facing {
    /// Heading in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        self.0
    }

    /// Nearest compass heading for a screen-space direction (y grows down).
    ///
    /// A zero or non-finite direction keeps `self`.
    #[must_use]
    pub fn toward(self, direction: Vec2) -> Self {
        if direction.try_normalize().is_none() {
            return self;
        }
        let angle = (direction.y.atan2(direction.x).to_degrees() + 90.0).rem_euclid(360.0);

        let mut best = DIRECTIONS[0];
        let mut best_diff = f32::MAX;
        for d in DIRECTIONS {
            let diff = (f32::from(d) - angle).abs();
            let diff = diff.min(360.0 - diff);
            if diff < best_diff {
                best_diff = diff;
                best = d;
            }
        }
        Self(best)
    }

    /// Zero-padded three digit sprite key, e.g. `"045"`.
    #[must_use]
    pub fn key(self) -> String {
        format!("{:03}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_cardinal_directions() {
        let f = Facing::default();
        assert_eq!(f.toward(Vec2::new(0.0, -1.0)).key(), "000");
        assert_eq!(f.toward(Vec2::new(1.0, 0.0)).key(), "090");
        assert_eq!(f.toward(Vec2::new(0.0, 1.0)).key(), "180");
        assert_eq!(f.toward(Vec2::new(-1.0, 0.0)).key(), "270");
    }

    #[test]
    fn test_facing_diagonal_and_wraparound() {
        let f = Facing::default();
        assert_eq!(f.toward(Vec2::new(1.0, -1.0)).degrees(), 45);
        assert_eq!(f.toward(Vec2::new(-1.0, -1.0)).degrees(), 315);
        // Just west of north wraps to 000 rather than 337.
        assert_eq!(f.toward(Vec2::new(-0.01, -1.0)).degrees(), 0);
    }

    #[test]
    fn test_facing_keeps_heading_without_direction() {
        let f = Facing::default().toward(Vec2::new(1.0, 0.0));
        assert_eq!(f.toward(Vec2::ZERO), f);
        assert_eq!(f.toward(Vec2::new(f32::NAN, 1.0)), f);
    }

    #[test]
    fn test_anim_advance_wraps_per_mode() {
        let config = SimConfig::default();
        let mut anim = AnimState {
            mode: AnimMode::Walk,
            frame: 7.9,
            attack_frame: 0.0,
        };
        anim.advance(1.0, &config);
        assert!(anim.frame < 1.0);
        assert_eq!(anim.attack_frame, 0.0);

        anim.mode = AnimMode::Attack;
        anim.advance(3.0, &config);
        assert!((anim.attack_frame - 0.6).abs() < 1e-5);
    }
}
