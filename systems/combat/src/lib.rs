#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that judges attack opportunities and rolls their damage.
//!
//! Eligibility and hit probability depend only on the snapshots handed in.
//! Rolls draw from a caller-owned generator so that a seeded world replays
//! identically.

use aerial_tactics_core::{
    range::inverse_lerp, RangeFloat4, TeamId, UnitId, UnitState, UnitStats,
};
use glam::Vec3;
use rand::Rng;

/// Weapon characteristics of an attacking unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackProfile {
    /// Reach bands; full strength up to `midg`, falling off towards `max`.
    pub distances: RangeFloat4,
    /// Half-angle of the weapon cone in degrees.
    pub max_angle: f32,
    /// Damage dealt per successful roll.
    pub power: f32,
    /// Number of rolls per attack.
    pub rolls: u32,
    /// Per-roll hit probability at full strength.
    pub base_probability: f32,
}

impl From<&UnitStats> for AttackProfile {
    fn from(stats: &UnitStats) -> Self {
        Self {
            distances: stats.attack_distances,
            max_angle: stats.attack_max_angle,
            power: stats.attack_power,
            rolls: stats.attack_rolls,
            base_probability: stats.attack_base_probability,
        }
    }
}

/// Snapshot of the attacking unit after its move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attacker {
    /// Team the attacker fights for.
    pub team: TeamId,
    /// Altitude level the attacker flies at.
    pub altitude: i32,
    /// Ground position.
    pub position: Vec3,
    /// Heading on the ground plane.
    pub forward: Vec3,
    /// Weapon characteristics.
    pub profile: AttackProfile,
}

/// Snapshot of a potential target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Identifier of the candidate.
    pub unit: UnitId,
    /// Team the candidate fights for.
    pub team: TeamId,
    /// Committed altitude level.
    pub altitude: i32,
    /// Ground position.
    pub position: Vec3,
    /// Radius used for targeting.
    pub hitbox_radius: f32,
    /// Current action state.
    pub state: UnitState,
}

/// Valid attack opportunity against a candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Engagement {
    /// Target of the attack.
    pub target: UnitId,
    /// Planar distance to the target.
    pub distance: f32,
    /// Signed bearing of the target in degrees.
    pub angle: f32,
    /// Per-roll hit probability.
    pub probability: f32,
}

/// Evaluates whether `attacker` may engage `candidate`.
///
/// Returns `None` for friendly, differently-leveled or busy candidates and
/// for candidates outside the weapon cone. Reach and cone both widen by the
/// candidate's hitbox.
#[must_use]
pub fn evaluate(attacker: &Attacker, candidate: &Candidate) -> Option<Engagement> {
    if candidate.team == attacker.team
        || candidate.altitude != attacker.altitude
        || candidate.state != UnitState::Wait
    {
        return None;
    }

    let offset = flatten(candidate.position - attacker.position);
    let forward = flatten(attacker.forward);
    let distance = offset.length();
    let angle = signed_angle(forward, offset);

    let profile = &attacker.profile;
    let max_distance = profile.distances.max + candidate.hitbox_radius;
    let widening = if distance > 0.0 {
        (candidate.hitbox_radius / distance).min(1.0).asin().to_degrees()
    } else {
        90.0
    };
    let max_angle = profile.max_angle + widening;

    if distance >= max_distance || angle.abs() >= max_angle {
        return None;
    }

    let distance_falloff =
        1.0 - inverse_lerp(profile.distances.midg, max_distance, distance).clamp(0.0, 1.0);
    let angle_falloff =
        1.0 - inverse_lerp(profile.max_angle, max_angle, angle.abs()).clamp(0.0, 1.0);

    Some(Engagement {
        target: candidate.unit,
        distance,
        angle,
        probability: profile.base_probability * distance_falloff * angle_falloff,
    })
}

/// Rolls `rolls` independent hits, each worth `power` with chance `probability`.
///
/// Misses are reported as zero so the reveal order matches the roll order.
pub fn roll_hits<R: Rng + ?Sized>(
    rng: &mut R,
    probability: f32,
    rolls: u32,
    power: f32,
) -> Vec<f32> {
    (0..rolls)
        .map(|_| {
            if rng.gen::<f32>() < probability {
                power
            } else {
                0.0
            }
        })
        .collect()
}

fn flatten(vector: Vec3) -> Vec3 {
    Vec3::new(vector.x, 0.0, vector.z)
}

fn signed_angle(from: Vec3, to: Vec3) -> f32 {
    let sine = from.cross(to).dot(Vec3::Y);
    let cosine = from.dot(to);
    sine.atan2(cosine).to_degrees()
}
