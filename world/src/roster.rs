//! Per-tick snapshot of every registered unit.

use aerial_tactics_core::{TeamId, UnitId, UnitState};
use glam::Vec3;

use crate::unit::Transform;

/// What other controllers may observe about a unit during a tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RosterEntry {
    pub(crate) unit: UnitId,
    pub(crate) team: TeamId,
    pub(crate) state: UnitState,
    pub(crate) transform: Transform,
    pub(crate) altitude: i32,
    pub(crate) hitbox_radius: f32,
    pub(crate) cruise_distance: f32,
}

impl RosterEntry {
    /// Point the camera centres on when the unit is picked.
    pub(crate) fn focus_point(&self) -> Vec3 {
        self.transform.world_point() + self.transform.forward() * self.cruise_distance
    }
}

/// Units whose hitbox touches the sphere of `radius` around `point`.
///
/// The test is inclusive: touching hitboxes count as overlapping.
pub(crate) fn units_in_point(roster: &[RosterEntry], point: Vec3, radius: f32) -> Vec<UnitId> {
    roster
        .iter()
        .filter(|entry| {
            entry.transform.world_point().distance(point) <= entry.hitbox_radius + radius
        })
        .map(|entry| entry.unit)
        .collect()
}
