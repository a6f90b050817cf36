//! Scenario configuration loaded once before a skirmish starts.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    envelope::{MoveAdjust, MoveArea},
    input::Frame,
    range::{RangeFloat2, RangeFloat4},
    TeamId,
};

/// Reasons a scenario is rejected at load time.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A range has control points out of order.
    #[error("`{field}` of unit `{unit}` is not monotonic")]
    NonMonotonicRange {
        /// Catalog name of the offending unit.
        unit: String,
        /// Field holding the range.
        field: &'static str,
    },
    /// A size or count that must be positive is not.
    #[error("`{field}` of unit `{unit}` must be positive")]
    NonPositive {
        /// Catalog name of the offending unit.
        unit: String,
        /// Field holding the value.
        field: &'static str,
    },
    /// A fraction lies outside `0..=1`.
    #[error("`{field}` of unit `{unit}` must lie within 0..=1")]
    FractionOutOfRange {
        /// Catalog name of the offending unit.
        unit: String,
        /// Field holding the value.
        field: &'static str,
    },
    /// Two teams share an identifier.
    #[error("team id {0} is declared more than once")]
    DuplicateTeam(u32),
    /// Two catalog entries share a name.
    #[error("unit `{0}` is declared more than once")]
    DuplicateUnit(String),
    /// A placement names a unit missing from the catalog.
    #[error("placement references unknown unit `{0}`")]
    UnknownUnit(String),
    /// A placement or building names an undeclared team.
    #[error("reference to unknown team {0}")]
    UnknownTeam(u32),
    /// The level altitude configuration is unusable.
    #[error("altitude height must be positive and the altitude range ordered")]
    InvalidAltitude,
    /// A spawn lies outside the level's altitude range or input fractions.
    #[error("spawn of unit `{unit}` is out of range: {reason}")]
    InvalidSpawn {
        /// Catalog name of the spawned unit.
        unit: String,
        /// Description of the violated bound.
        reason: &'static str,
    },
}

/// Static stats of a unit class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Catalog name used by placements.
    pub name: String,
    /// Health at full strength.
    pub max_health: f32,
    /// Radius used for collisions and targeting.
    pub hitbox_radius: f32,
    /// Envelope of reachable moves.
    pub move_area: MoveArea,
    /// Per-turn input tolerances.
    pub move_adjust: MoveAdjust,
    /// Weapon reach bands.
    pub attack_distances: RangeFloat4,
    /// Half-angle of the weapon cone in degrees.
    pub attack_max_angle: f32,
    /// Damage dealt per successful roll.
    pub attack_power: f32,
    /// Number of rolls per attack.
    pub attack_rolls: u32,
    /// Per-roll hit probability inside the full-strength band.
    pub attack_base_probability: f32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            name: String::from("fighter"),
            max_health: 100.0,
            hitbox_radius: 1.5,
            move_area: MoveArea::default(),
            move_adjust: MoveAdjust::default(),
            attack_distances: RangeFloat4::new(0.0, 0.0, 10.0, 30.0),
            attack_max_angle: 2.5,
            attack_power: 5.0,
            attack_rolls: 10,
            attack_base_probability: 0.8,
        }
    }
}

impl UnitStats {
    /// Checks ranges, sizes and fractions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = || self.name.clone();

        let ranges = [
            ("move_area.distances", self.move_area.distances.is_monotonic()),
            ("move_area.near_angles", self.move_area.near_angles.is_monotonic()),
            ("move_area.far_angles", self.move_area.far_angles.is_monotonic()),
            ("attack_distances", self.attack_distances.is_monotonic()),
        ];
        if let Some((field, _)) = ranges.iter().find(|(_, ordered)| !ordered) {
            return Err(ConfigError::NonMonotonicRange {
                unit: unit(),
                field: *field,
            });
        }

        let positives = [
            ("max_health", self.max_health > 0.0),
            ("hitbox_radius", self.hitbox_radius > 0.0),
            ("attack_max_angle", self.attack_max_angle > 0.0),
            ("attack_power", self.attack_power > 0.0),
            ("attack_rolls", self.attack_rolls > 0),
        ];
        if let Some((field, _)) = positives.iter().find(|(_, positive)| !positive) {
            return Err(ConfigError::NonPositive {
                unit: unit(),
                field: *field,
            });
        }

        let fractions = [
            ("attack_base_probability", self.attack_base_probability),
            ("move_adjust.acceleration", self.move_adjust.acceleration),
            ("move_adjust.agility", self.move_adjust.agility),
        ];
        if let Some((field, _)) = fractions
            .iter()
            .find(|(_, value)| !(0.0..=1.0).contains(value))
        {
            return Err(ConfigError::FractionOutOfRange {
                unit: unit(),
                field: *field,
            });
        }

        Ok(())
    }
}

/// Team taking part in the skirmish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    /// Identifier referenced by placements.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Turn order rank; lower acts first.
    pub priority: i32,
    /// Display colour as RGB.
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    /// Optional insignia asset name.
    #[serde(default)]
    pub insignia: Option<String>,
}

fn default_color() -> [u8; 3] {
    [255, 255, 255]
}

/// Level-wide altitude configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    /// Lowest and highest selectable altitude levels.
    pub altitude_range: RangeFloat2,
    /// World units between two altitude levels.
    pub altitude_height: f32,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            altitude_range: RangeFloat2::new(1.0, 5.0),
            altitude_height: 10.0,
        }
    }
}

impl LevelSettings {
    /// Restricts an altitude level to the configured range.
    #[must_use]
    pub fn clamp_altitude(&self, altitude: i32) -> i32 {
        let low = self.altitude_range.min.ceil() as i32;
        let high = self.altitude_range.max.floor() as i32;
        altitude.max(low).min(high)
    }

    /// World height of an altitude level.
    #[must_use]
    pub fn height_of(&self, altitude: i32) -> f32 {
        altitude as f32 * self.altitude_height
    }

    /// Checks the altitude configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.altitude_height > 0.0 && self.altitude_range.is_monotonic() {
            Ok(())
        } else {
            Err(ConfigError::InvalidAltitude)
        }
    }
}

/// Initial placement and flight state of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSpawn {
    /// Ground position as `[x, z]`.
    pub position: [f32; 2],
    /// Heading in degrees, clockwise from +Z towards +X.
    pub heading: f32,
    /// Initial altitude level.
    pub altitude: i32,
    /// Initial health as a fraction of the maximum.
    pub health: f32,
    /// Initial speed fraction.
    pub speed: f32,
    /// Initial steer fraction.
    pub steer: f32,
}

impl Default for UnitSpawn {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            heading: 0.0,
            altitude: 2,
            health: 1.0,
            speed: 0.5,
            steer: 0.5,
        }
    }
}

impl UnitSpawn {
    /// Ground frame the unit starts in.
    #[must_use]
    pub fn frame(&self) -> Frame {
        Frame::new(
            Vec3::new(self.position[0], 0.0, self.position[1]),
            Quat::from_rotation_y(self.heading.to_radians()),
        )
    }

    fn validate(&self, unit: &str, level: &LevelSettings) -> Result<(), ConfigError> {
        let reason = if level.clamp_altitude(self.altitude) != self.altitude {
            Some("altitude outside the level's altitude range")
        } else if !(0.0..=1.0).contains(&self.health) || self.health == 0.0 {
            Some("health must lie within (0, 1]")
        } else if !(0.0..=1.0).contains(&self.speed) || !(0.0..=1.0).contains(&self.steer) {
            Some("speed and steer must lie within 0..=1")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ConfigError::InvalidSpawn {
                unit: unit.to_owned(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Unit of a catalog class placed for a team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Catalog name of the unit class.
    pub unit: String,
    /// Team the unit fights for.
    pub team: TeamId,
    /// Initial placement and flight state.
    #[serde(default)]
    pub spawn: UnitSpawn,
}

/// Capturable structure on the map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingInfo {
    /// Owning team, if captured.
    #[serde(default)]
    pub team: Option<TeamId>,
    /// Ground position as `[x, z]`.
    pub position: [f32; 2],
    /// Radius within which the building can be captured.
    #[serde(default = "default_capture_range")]
    pub capture_range: f32,
}

fn default_capture_range() -> f32 {
    50.0
}

/// Complete description of a skirmish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Seed for the attack roll generator.
    #[serde(default)]
    pub seed: u64,
    /// Altitude configuration.
    #[serde(default)]
    pub level: LevelSettings,
    /// Teams taking part.
    pub teams: Vec<TeamInfo>,
    /// Unit classes available to placements.
    pub units: Vec<UnitStats>,
    /// Units placed on the map, in registration order.
    pub placements: Vec<Placement>,
    /// Buildings placed on the map.
    #[serde(default)]
    pub buildings: Vec<BuildingInfo>,
}

impl Scenario {
    /// Looks up a team by identifier.
    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&TeamInfo> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Looks up a unit class by catalog name.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&UnitStats> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Checks every cross reference and value bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level.validate()?;

        let mut team_ids = HashSet::new();
        for team in &self.teams {
            if !team_ids.insert(team.id) {
                return Err(ConfigError::DuplicateTeam(team.id.get()));
            }
        }

        let mut unit_names = HashSet::new();
        for unit in &self.units {
            if !unit_names.insert(unit.name.as_str()) {
                return Err(ConfigError::DuplicateUnit(unit.name.clone()));
            }
            unit.validate()?;
        }

        for placement in &self.placements {
            if self.unit(&placement.unit).is_none() {
                return Err(ConfigError::UnknownUnit(placement.unit.clone()));
            }
            if !team_ids.contains(&placement.team) {
                return Err(ConfigError::UnknownTeam(placement.team.get()));
            }
            placement.spawn.validate(&placement.unit, &self.level)?;
        }

        for building in &self.buildings {
            if let Some(team) = building.team {
                if !team_ids.contains(&team) {
                    return Err(ConfigError::UnknownTeam(team.get()));
                }
            }
        }

        Ok(())
    }
}
