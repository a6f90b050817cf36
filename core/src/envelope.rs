//! Move envelope mapping (speed, steer) inputs onto (distance, azimuth) outcomes.

use serde::{Deserialize, Serialize};

use crate::range::{lerp, RangeFloat2};

/// Normalised control input chosen for a turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveInput {
    /// Speed fraction in `[0, 1]`.
    pub speed: f32,
    /// Steer fraction in `[0, 1]`; 0.5 flies straight.
    pub steer: f32,
}

impl MoveInput {
    /// Creates a new input pair.
    #[must_use]
    pub const fn new(speed: f32, steer: f32) -> Self {
        Self { speed, steer }
    }
}

/// Flight outcome expressed in the unit's local polar coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Chord length between start and end of the turn.
    pub distance: f32,
    /// Signed bearing of the end point in degrees, positive to the right.
    pub azimuth: f32,
}

impl MoveResult {
    /// Creates a new outcome.
    #[must_use]
    pub const fn new(distance: f32, azimuth: f32) -> Self {
        Self { distance, azimuth }
    }
}

/// Per-turn tolerances around the current input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveAdjust {
    /// Maximum change of the speed fraction within one turn.
    pub acceleration: f32,
    /// Maximum change of the steer fraction within one turn.
    pub agility: f32,
}

impl MoveAdjust {
    /// Creates a new tolerance pair.
    #[must_use]
    pub const fn new(acceleration: f32, agility: f32) -> Self {
        Self {
            acceleration,
            agility,
        }
    }
}

impl Default for MoveAdjust {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Trapezoidal envelope of reachable (distance, azimuth) outcomes.
///
/// The azimuth bounds widen from `far_angles` at full speed to `near_angles`
/// at zero speed, linearly in the speed fraction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveArea {
    /// Distance reached at zero and full speed.
    pub distances: RangeFloat2,
    /// Azimuth bounds at zero speed.
    pub near_angles: RangeFloat2,
    /// Azimuth bounds at full speed.
    pub far_angles: RangeFloat2,
}

impl Default for MoveArea {
    fn default() -> Self {
        Self::new(
            RangeFloat2::new(5.0, 20.0),
            RangeFloat2::new(-30.0, 30.0),
            RangeFloat2::new(-10.0, 10.0),
        )
    }
}

impl MoveArea {
    /// Creates an envelope from its three ranges.
    #[must_use]
    pub const fn new(
        distances: RangeFloat2,
        near_angles: RangeFloat2,
        far_angles: RangeFloat2,
    ) -> Self {
        Self {
            distances,
            near_angles,
            far_angles,
        }
    }

    /// Azimuth bounds reachable at the provided speed fraction.
    #[must_use]
    pub fn angles_at(&self, speed: f32) -> RangeFloat2 {
        RangeFloat2::new(
            lerp(self.near_angles.min, self.far_angles.min, speed),
            lerp(self.near_angles.max, self.far_angles.max, speed),
        )
    }

    /// Maps an input onto the outcome it produces.
    #[must_use]
    pub fn evaluate(&self, input: MoveInput) -> MoveResult {
        MoveResult::new(
            self.distances.lerp(input.speed),
            self.angles_at(input.speed).lerp(input.steer),
        )
    }

    /// Recovers the input producing `result`.
    ///
    /// Fractions are not clamped: outcomes outside the envelope yield inputs
    /// outside `[0, 1]`.
    #[must_use]
    pub fn inverse(&self, result: MoveResult) -> MoveInput {
        let speed = self.distances.inverse_lerp(result.distance);
        let steer = self.angles_at(speed).inverse_lerp(result.azimuth);
        MoveInput::new(speed, steer)
    }

    /// Restricts the envelope to what is reachable from `current` within `adjust`.
    #[must_use]
    pub fn sub_area(&self, current: MoveInput, adjust: MoveAdjust) -> MoveArea {
        let slow = current.speed - adjust.acceleration;
        let fast = current.speed + adjust.acceleration;
        let near_by_speed = self.angles_at(slow);
        let far_by_speed = self.angles_at(fast);
        let left = current.steer - adjust.agility;
        let right = current.steer + adjust.agility;

        MoveArea::new(
            RangeFloat2::new(self.distances.lerp(slow), self.distances.lerp(fast)),
            RangeFloat2::new(near_by_speed.lerp(left), near_by_speed.lerp(right)),
            RangeFloat2::new(far_by_speed.lerp(left), far_by_speed.lerp(right)),
        )
    }

    /// Widens every range by the provided slack.
    #[must_use]
    pub fn expand(
        &self,
        distances: RangeFloat2,
        near_angles: RangeFloat2,
        far_angles: RangeFloat2,
    ) -> MoveArea {
        MoveArea::new(
            self.distances + distances,
            self.near_angles + near_angles,
            self.far_angles + far_angles,
        )
    }

    /// Projects `result` onto the closest outcome inside the envelope.
    #[must_use]
    pub fn clamp(&self, result: MoveResult) -> MoveResult {
        let distance = self.distances.clamp(result.distance);
        let speed = self.distances.inverse_lerp(distance);
        MoveResult::new(distance, self.angles_at(speed).clamp(result.azimuth))
    }

    /// Reports whether `result` lies inside the envelope.
    #[must_use]
    pub fn is_include(&self, result: MoveResult) -> bool {
        if !self.distances.is_include(result.distance) {
            return false;
        }
        let speed = self.distances.inverse_lerp(result.distance);
        self.angles_at(speed).is_include(result.azimuth)
    }

    /// Reports whether every range is ordered.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.distances.is_monotonic()
            && self.near_angles.is_monotonic()
            && self.far_angles.is_monotonic()
    }
}
