//! Tube surface geometry
//!
//! The sprite rides the bottom of a tube seen from inside. A tilt value in
//! [-1, 1] slides it along a curved arc at the player's depth; obstacles
//! travel from the vanishing point out to the same arc.
//!
//! The arc rise uses a half-cosine: flat at the bottom of the tube, steepest
//! mid-wall, level again at the walls. `rise(0) = 0`, `rise(±1) = curve_height`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp_unit;
use crate::consts::*;

/// Screen-space transform for the sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TubePosition {
    pub pos: Vec2,
    /// Lean into the tube wall (degrees, positive = clockwise)
    pub rotation_degrees: f32,
}

/// Screen-space placement for an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPlacement {
    pub pos: Vec2,
    /// Perspective scale (1.0 = full size at the player plane)
    pub scale: f32,
}

/// Tube layout resolved against a concrete viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TubeGeometry {
    pub vanishing_point: Vec2,
    pub arc_base_y: f32,
    pub arc_half_width: f32,
    pub arc_curve_height: f32,
}

impl TubeGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            vanishing_point: Vec2::new(width * VANISHING_X, height * VANISHING_Y),
            arc_base_y: height * ARC_BASE_Y,
            arc_half_width: width * ARC_HALF_WIDTH,
            arc_curve_height: height * ARC_CURVE_HEIGHT,
        }
    }

    /// Height the arc climbs above its base at tilt `t`
    #[inline]
    pub fn rise(&self, t: f32) -> f32 {
        let t = clamp_unit(t);
        self.arc_curve_height * (1.0 - (t * std::f32::consts::PI).cos()) / 2.0
    }

    /// Map a tilt value to the sprite's position on the tube surface.
    /// `t = 0` is the bottom center, `t = -1` the left wall, `t = 1` the right wall.
    pub fn tilt_to_position(&self, t: f32) -> TubePosition {
        let t = clamp_unit(t);
        let x = self.vanishing_point.x + t * self.arc_half_width;
        let y = self.arc_base_y - self.rise(t);
        TubePosition {
            pos: Vec2::new(x, y),
            rotation_degrees: t * LEAN_DEGREES,
        }
    }

    /// Place an obstacle at `lane` and `depth` between the vanishing point and
    /// the tube surface. Depth is deliberately unclamped: obstacles overshoot
    /// the player plane before they are discarded.
    pub fn obstacle_screen_position(&self, lane: f32, depth: f32) -> ScreenPlacement {
        let target = self.tilt_to_position(lane).pos;
        let pos = self.vanishing_point + (target - self.vanishing_point) * depth;
        ScreenPlacement {
            pos,
            scale: depth * depth,
        }
    }
}

/// Whether the sprite at `player_tilt` touches an obstacle in `obstacle_lane`
#[inline]
pub fn check_collision(player_tilt: f32, obstacle_lane: f32, threshold: f32) -> bool {
    (player_tilt - obstacle_lane).abs() < threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn geometry() -> TubeGeometry {
        TubeGeometry::new(400.0, 800.0)
    }

    #[test]
    fn test_center_is_tube_bottom() {
        let g = geometry();
        let p = g.tilt_to_position(0.0);
        assert_eq!(p.pos, Vec2::new(200.0, 800.0 * ARC_BASE_Y));
        assert_eq!(p.rotation_degrees, 0.0);
    }

    #[test]
    fn test_walls_reach_full_rise() {
        let g = geometry();
        for t in [-1.0, 1.0] {
            assert!((g.rise(t) - g.arc_curve_height).abs() < 1e-4);
        }
        // Out-of-range tilt clamps to the wall
        assert_eq!(g.tilt_to_position(4.0), g.tilt_to_position(1.0));
    }

    #[test]
    fn test_obstacle_starts_at_vanishing_point() {
        let g = geometry();
        let p = g.obstacle_screen_position(0.5, 0.0);
        assert_eq!(p.pos, g.vanishing_point);
        assert_eq!(p.scale, 0.0);

        let at_plane = g.obstacle_screen_position(0.5, 1.0);
        assert!((at_plane.pos - g.tilt_to_position(0.5).pos).length() < 1e-3);
    }

    #[test]
    fn test_obstacle_overshoots_past_player_plane() {
        let g = geometry();
        let at_plane = g.obstacle_screen_position(-0.8, 1.0);
        let past = g.obstacle_screen_position(-0.8, 1.2);
        assert!(past.pos.x < at_plane.pos.x);
        assert!(past.scale > 1.0);
    }

    #[test]
    fn test_collision_boundary_is_strict() {
        assert!(check_collision(0.0, 0.19, 0.2));
        assert!(!check_collision(0.5, 0.0, 0.2));
        // Exactly representable boundary distance
        assert!(!check_collision(0.25, 0.5, 0.25));
        assert!(!check_collision(-0.5, -0.25, 0.25));
    }

    proptest! {
        #[test]
        fn prop_rotation_is_linear(t in -1.0f32..=1.0) {
            prop_assert_eq!(geometry().tilt_to_position(t).rotation_degrees, t * 35.0);
        }

        #[test]
        fn prop_x_monotonic(a in -1.0f32..=1.0, b in -1.0f32..=1.0) {
            let g = geometry();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(g.tilt_to_position(lo).pos.x <= g.tilt_to_position(hi).pos.x);
        }

        #[test]
        fn prop_rise_bounded_and_symmetric(t in -1.0f32..=1.0) {
            let g = geometry();
            let rise = g.rise(t);
            prop_assert!(rise >= 0.0 && rise <= g.arc_curve_height + 1e-4);
            prop_assert!((rise - g.rise(-t)).abs() < 1e-4);
        }

        #[test]
        fn prop_rise_monotonic_in_magnitude(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let g = geometry();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(g.rise(lo) <= g.rise(hi) + 1e-4);
        }

        #[test]
        fn prop_scale_is_depth_squared(lane in -1.0f32..=1.0, depth in 0.0f32..=1.0) {
            prop_assert_eq!(geometry().obstacle_screen_position(lane, depth).scale, depth * depth);
        }

        #[test]
        fn prop_collision_matches_distance(a in -1.0f32..=1.0, b in -1.0f32..=1.0) {
            prop_assert_eq!(check_collision(a, b, 0.2), (a - b).abs() < 0.2);
        }
    }
}
