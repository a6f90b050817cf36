//! Flight path geometry parametrised by normalised time.
//!
//! Paths live in the unit's local frame: the unit starts at the origin facing
//! +Z with +Y up, and positive azimuths turn towards +X.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::envelope::MoveResult;
use crate::range::smooth_step;

/// Azimuths closer to zero than this, in degrees, fly a straight line.
const STRAIGHT_EPSILON: f32 = 1e-4;

/// Capabilities shared by every trajectory a unit can follow.
pub trait FlightPath {
    /// Position on the ground plane at fraction `t`.
    fn point_projection_at(&self, t: f32) -> Vec3;

    /// Vertical offset at fraction `t`.
    fn height_at(&self, t: f32) -> f32;

    /// Heading on the ground plane at fraction `t`.
    fn direction_projection_at(&self, t: f32) -> Vec3;

    /// Banking normal at fraction `t`.
    fn up_at(&self, t: f32) -> Vec3;

    /// Full tangent at fraction `t`, including climb.
    fn direction_at(&self, t: f32) -> Vec3;

    /// Fraction at which the path has covered `length` world units.
    fn value_by_length(&self, length: f32) -> f32;

    /// Position at fraction `t`, including climb.
    fn point_at(&self, t: f32) -> Vec3 {
        self.point_projection_at(t) + Vec3::Y * self.height_at(t)
    }
}

/// Constant-radius turn through a chord of `distance` at bearing `azimuth`,
/// climbing by `climb` along the way.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnPath {
    distance: f32,
    azimuth: f32,
    climb: f32,
    radius: f32,
    arc_angle: f32,
}

impl TurnPath {
    /// Builds the turn reaching polar `(distance, azimuth)` from the origin.
    #[must_use]
    pub fn new(distance: f32, azimuth: f32, climb: f32) -> Self {
        let (radius, arc_angle) = turn_geometry(distance, azimuth);
        Self {
            distance,
            azimuth,
            climb,
            radius,
            arc_angle,
        }
    }

    /// Builds the turn reaching `result` with the provided climb.
    #[must_use]
    pub fn from_result(result: MoveResult, climb: f32) -> Self {
        Self::new(result.distance, result.azimuth, climb)
    }

    /// Chord length of the turn.
    #[must_use]
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Bearing of the end point in degrees.
    #[must_use]
    pub const fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Height gained over the turn.
    #[must_use]
    pub const fn climb(&self) -> f32 {
        self.climb
    }

    /// Signed turn radius; infinite for straight paths.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Signed heading change over the whole turn in radians.
    #[must_use]
    pub const fn arc_angle(&self) -> f32 {
        self.arc_angle
    }

    /// Reports whether the path degenerates into a straight line.
    #[must_use]
    pub fn is_straight(&self) -> bool {
        self.arc_angle == 0.0
    }

    /// Ground distance covered along the arc.
    #[must_use]
    pub fn arc_length(&self) -> f32 {
        if self.is_straight() {
            self.distance
        } else {
            (self.arc_angle * self.radius).abs()
        }
    }

    fn climb_rate_at(&self, t: f32) -> f32 {
        (-6.0 * t * t + 6.0 * t) * self.climb
    }
}

fn turn_geometry(distance: f32, azimuth: f32) -> (f32, f32) {
    if azimuth.abs() < STRAIGHT_EPSILON || distance == 0.0 {
        return (f32::INFINITY, 0.0);
    }

    let bearing = azimuth.to_radians();
    let end_x = bearing.sin() * distance;
    let end_z = bearing.cos() * distance;
    let radius = (end_x * end_x + end_z * end_z) / (2.0 * end_x);
    let arc_angle = if radius > 0.0 {
        PI - end_z.atan2(end_x - radius)
    } else {
        -(PI - end_z.atan2(radius - end_x))
    };
    (radius, arc_angle)
}

impl FlightPath for TurnPath {
    fn point_projection_at(&self, t: f32) -> Vec3 {
        if self.is_straight() {
            return Vec3::new(0.0, 0.0, self.distance * t);
        }
        let swept = self.arc_angle * t;
        let half = (swept * 0.5).sin();
        Vec3::new(2.0 * self.radius * half * half, 0.0, self.radius * swept.sin())
    }

    fn height_at(&self, t: f32) -> f32 {
        smooth_step(0.0, self.climb, t)
    }

    fn direction_projection_at(&self, t: f32) -> Vec3 {
        if self.is_straight() {
            return Vec3::Z;
        }
        let heading = FRAC_PI_2 - self.arc_angle * t;
        Vec3::new(heading.cos(), 0.0, heading.sin())
    }

    fn up_at(&self, t: f32) -> Vec3 {
        let sideways = self.direction_projection_at(t).cross(Vec3::Y);
        sideways.cross(self.direction_at(t)).normalize_or_zero()
    }

    fn direction_at(&self, t: f32) -> Vec3 {
        let rise = self.climb_rate_at(t);
        if self.is_straight() {
            return Vec3::new(0.0, rise, self.distance).normalize_or_zero();
        }
        let heading = FRAC_PI_2 - self.arc_angle * t;
        let ground_speed = self.arc_angle * self.radius;
        Vec3::new(heading.cos() * ground_speed, rise, heading.sin() * ground_speed)
            .normalize_or_zero()
    }

    fn value_by_length(&self, length: f32) -> f32 {
        let total = self.arc_length();
        if total == 0.0 {
            0.0
        } else {
            length / total
        }
    }
}

/// Continues a turn in real time while falling under gravity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropPath {
    turn: TurnPath,
    gravity: f32,
    duration: f32,
}

impl DropPath {
    /// Continues `turn` for `duration` turn-lengths with vertical acceleration `gravity`.
    #[must_use]
    pub const fn new(turn: TurnPath, gravity: f32, duration: f32) -> Self {
        Self {
            turn,
            gravity,
            duration,
        }
    }

    /// Turn that the fall continues.
    #[must_use]
    pub const fn turn(&self) -> &TurnPath {
        &self.turn
    }

    /// Vertical acceleration, negative downwards.
    #[must_use]
    pub const fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Wall-clock length of the fall in seconds.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }
}

impl FlightPath for DropPath {
    fn point_projection_at(&self, t: f32) -> Vec3 {
        self.turn.point_at(self.duration * t)
    }

    fn height_at(&self, t: f32) -> f32 {
        let elapsed = self.duration * t;
        0.5 * self.gravity * elapsed * elapsed
    }

    fn direction_projection_at(&self, t: f32) -> Vec3 {
        self.turn.direction_projection_at(self.duration * t)
    }

    fn up_at(&self, _t: f32) -> Vec3 {
        Vec3::Y
    }

    fn direction_at(&self, t: f32) -> Vec3 {
        self.turn.direction_at(self.duration * t)
    }

    fn value_by_length(&self, length: f32) -> f32 {
        if self.duration == 0.0 {
            0.0
        } else {
            self.turn.value_by_length(length / self.duration)
        }
    }
}

/// Trajectory of a single turn as stored in a unit's trail history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Path {
    /// Regular flight turn.
    Turn(TurnPath),
    /// Ballistic fall continuing a turn.
    Drop(DropPath),
    /// Placeholder without displacement.
    Blank,
}

impl From<TurnPath> for Path {
    fn from(path: TurnPath) -> Self {
        Path::Turn(path)
    }
}

impl From<DropPath> for Path {
    fn from(path: DropPath) -> Self {
        Path::Drop(path)
    }
}

impl FlightPath for Path {
    fn point_projection_at(&self, t: f32) -> Vec3 {
        match self {
            Path::Turn(path) => path.point_projection_at(t),
            Path::Drop(path) => path.point_projection_at(t),
            Path::Blank => Vec3::ZERO,
        }
    }

    fn height_at(&self, t: f32) -> f32 {
        match self {
            Path::Turn(path) => path.height_at(t),
            Path::Drop(path) => path.height_at(t),
            Path::Blank => 0.0,
        }
    }

    fn direction_projection_at(&self, t: f32) -> Vec3 {
        match self {
            Path::Turn(path) => path.direction_projection_at(t),
            Path::Drop(path) => path.direction_projection_at(t),
            Path::Blank => Vec3::Z,
        }
    }

    fn up_at(&self, t: f32) -> Vec3 {
        match self {
            Path::Turn(path) => path.up_at(t),
            Path::Drop(path) => path.up_at(t),
            Path::Blank => Vec3::Y,
        }
    }

    fn direction_at(&self, t: f32) -> Vec3 {
        match self {
            Path::Turn(path) => path.direction_at(t),
            Path::Drop(path) => path.direction_at(t),
            Path::Blank => Vec3::Z,
        }
    }

    fn value_by_length(&self, length: f32) -> f32 {
        match self {
            Path::Turn(path) => path.value_by_length(length),
            Path::Drop(path) => path.value_by_length(length),
            Path::Blank => 0.0,
        }
    }
}
