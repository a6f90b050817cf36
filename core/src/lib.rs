#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Aerial Tactics engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values. Alongside the
//! messages live the value types every layer shares: piecewise ranges, the
//! move envelope, flight path geometry and the generic [`StateMachine`] that
//! sequences both turns and unit actions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod display;
pub mod envelope;
pub mod input;
pub mod path;
pub mod range;
pub mod state_machine;

pub use config::{
    BuildingInfo, ConfigError, LevelSettings, Placement, Scenario, TeamInfo, UnitSpawn, UnitStats,
};
pub use display::{DisplayCommand, DisplaySink, Effect, Indicator, Layer, Marker};
pub use envelope::{MoveAdjust, MoveArea, MoveInput, MoveResult};
pub use input::{Frame, FrameInput, InputQuery, Ray};
pub use path::{DropPath, FlightPath, Path, TurnPath};
pub use range::{RangeError, RangeFloat2, RangeFloat3, RangeFloat4};
pub use state_machine::{MachineState, StateInfo, StateMachine};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one step.
    Tick {
        /// Simulated time elapsed since the previous tick.
        dt: Duration,
        /// Player input gathered for this tick.
        input: FrameInput,
    },
    /// Adds a unit to the level, registering its team on first sight.
    RegisterUnit {
        /// Team the unit fights for.
        team: TeamInfo,
        /// Static stats of the unit.
        stats: UnitStats,
        /// Initial placement and flight state.
        spawn: UnitSpawn,
    },
    /// Removes a unit from the level.
    DeregisterUnit {
        /// Unit to remove.
        unit: UnitId,
    },
    /// Adds a building to the level.
    RegisterBuilding {
        /// Building to add.
        building: BuildingInfo,
    },
    /// Removes a building from the level.
    DeregisterBuilding {
        /// Building to remove.
        building: BuildingId,
    },
    /// Selects the next idle unit of the active team.
    FindNextAvailableUnit,
    /// Hands the turn to the next team once every unit has finished.
    ProgressTurn,
    /// Backs out of move selection.
    CancelMove {
        /// Unit selecting a move.
        unit: UnitId,
    },
    /// Raises or lowers the altitude selected for the pending move.
    ChangeAltitude {
        /// Unit selecting a move.
        unit: UnitId,
        /// Number of altitude levels to climb; negative to descend.
        delta: i32,
    },
    /// Reverts a committed move while choosing a target.
    UndoMove {
        /// Unit choosing a target.
        unit: UnitId,
    },
    /// Ends the unit's turn without attacking.
    SkipAttack {
        /// Unit choosing a target.
        unit: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a unit joined the level.
    UnitRegistered {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Team the unit fights for.
        team: TeamId,
    },
    /// Confirms that a unit left the level.
    UnitDeregistered {
        /// Identifier of the removed unit.
        unit: UnitId,
    },
    /// Confirms that a building joined the level.
    BuildingRegistered {
        /// Identifier assigned to the building.
        building: BuildingId,
    },
    /// Confirms that a building left the level.
    BuildingDeregistered {
        /// Identifier of the removed building.
        building: BuildingId,
    },
    /// Reports a change of the level's turn state.
    LevelStateChanged {
        /// State before the tick, if the level had started.
        from: Option<LevelState>,
        /// State after the tick.
        to: LevelState,
    },
    /// Reports a change of a unit's action state.
    UnitStateChanged {
        /// Unit that changed state.
        unit: UnitId,
        /// State before the tick, if the unit had started.
        from: Option<UnitState>,
        /// State after the tick.
        to: UnitState,
    },
    /// Announces that a team started acting.
    TurnStarted {
        /// Global turn number.
        turn: u32,
        /// Team now acting.
        team: TeamId,
    },
    /// Reports that the turn moved on to another team.
    TurnProgressed {
        /// Global turn number after progressing.
        turn: u32,
        /// Index of the acting team in priority order.
        team_index: usize,
    },
    /// Reports that a unit committed to a move.
    MoveCommitted {
        /// Moving unit.
        unit: UnitId,
        /// Path the unit will fly.
        path: TurnPath,
    },
    /// Reports the rolls of a confirmed attack.
    AttackResolved {
        /// Attacking unit.
        attacker: UnitId,
        /// Attacked unit.
        target: UnitId,
        /// Per-roll hit probability.
        probability: f32,
        /// Damage of every roll, zero for misses.
        hits: Vec<f32>,
    },
    /// Reports damage committed to a unit's health.
    DamageApplied {
        /// Damaged unit.
        unit: UnitId,
        /// Total damage taken.
        damage: f32,
        /// Health left afterwards.
        health: f32,
    },
    /// Reports that a unit was destroyed and finished falling.
    UnitDowned {
        /// Destroyed unit.
        unit: UnitId,
    },
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the unit identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(u32);

impl TeamId {
    /// Creates a new team identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the team identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the building identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Turn sequencing states of the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelState {
    /// Resets the turn counters.
    Initialize,
    /// Waits for every unit to commit its previous turn.
    Solidify,
    /// Announces the team about to act.
    PreTeamAction,
    /// Lets the active team act.
    TeamAction,
    /// Reserved for effects resolved between team turns.
    EnvironmentalAction,
    /// Terminal state after the skirmish is decided.
    Ended,
}

impl MachineState for LevelState {
    fn priority(self) -> u32 {
        match self {
            LevelState::Initialize => 0,
            LevelState::Solidify => 1,
            LevelState::PreTeamAction => 2,
            LevelState::TeamAction => 3,
            LevelState::EnvironmentalAction => 4,
            LevelState::Ended => 5,
        }
    }
}

/// Action sequencing states of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// Loads the initial snapshot.
    Initialize,
    /// Commits the previous turn's outcome.
    Solidify,
    /// Waits to be selected while its team acts.
    Idle,
    /// Chooses a move.
    MoveMenu,
    /// Flies the committed move.
    MoveAnimation,
    /// Chooses a target.
    AttackMenu,
    /// Plays the attack.
    AttackAnimation,
    /// Finished acting for this turn.
    Done,
    /// Waits while another team acts.
    Wait,
    /// Previews its next move while another team acts.
    AttackPrediction,
    /// Reveals incoming hits.
    DamageAnimation,
    /// Falls after being destroyed.
    DownAnimation,
    /// Destroyed.
    Downed,
}

impl UnitState {
    /// Whether the unit finished acting for the current team turn.
    #[must_use]
    pub const fn has_finished_turn(self) -> bool {
        matches!(
            self,
            UnitState::Done | UnitState::Downed | UnitState::DownAnimation
        )
    }

    /// Whether the unit sits out another team's turn.
    #[must_use]
    pub const fn is_standing_by(self) -> bool {
        matches!(
            self,
            UnitState::Wait | UnitState::Downed | UnitState::DownAnimation
        )
    }

    /// Whether the unit was destroyed.
    #[must_use]
    pub const fn is_down(self) -> bool {
        matches!(self, UnitState::Downed | UnitState::DownAnimation)
    }
}

impl MachineState for UnitState {
    fn priority(self) -> u32 {
        match self {
            UnitState::Initialize => 0,
            UnitState::Solidify => 1,
            UnitState::Idle => 2,
            UnitState::MoveMenu => 3,
            UnitState::MoveAnimation => 4,
            UnitState::AttackMenu => 5,
            UnitState::AttackAnimation => 6,
            UnitState::Done => 7,
            UnitState::Wait => 8,
            UnitState::AttackPrediction => 9,
            UnitState::DamageAnimation => 10,
            UnitState::DownAnimation => 11,
            UnitState::Downed => 12,
        }
    }
}
