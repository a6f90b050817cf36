#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for Aerial Tactics.
//!
//! The world owns the level turn controller, every registered unit with its
//! action controller, and the seeded generator used for attack rolls. All
//! mutation flows through [`apply`]; adapters observe the outcome through the
//! emitted events, the display sink and the [`query`] functions.

use std::time::Duration;

use aerial_tactics_core::{
    BuildingId, BuildingInfo, Command, ConfigError, DisplaySink, Event, FrameInput, InputQuery,
    LevelSettings, Scenario, TeamId, TeamInfo, UnitId, UnitSpawn, UnitStats,
};
use aerial_tactics_system_combat as combat;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

mod level;
mod maneuver;
mod reaction;
mod roster;
mod trail;
mod unit;

pub use unit::{ActionSnapshot, Transform};

use level::Level;
use roster::RosterEntry;
use unit::{Unit, UnitEnv, UnitOutput};

/// Capturable structure registered with the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Building {
    /// Identifier assigned on registration.
    pub id: BuildingId,
    /// Owning team, if captured.
    pub team: Option<TeamId>,
    /// Ground position.
    pub position: Vec3,
    /// Radius within which the building can be captured.
    pub capture_range: f32,
}

/// Represents the authoritative Aerial Tactics level.
#[derive(Debug)]
pub struct World {
    settings: LevelSettings,
    level: Level,
    units: Vec<Unit>,
    buildings: Vec<Building>,
    next_unit: u32,
    next_building: u32,
    rng: ChaCha8Rng,
    tick_index: u64,
}

impl World {
    /// Creates an empty level whose attack rolls are seeded by `seed`.
    #[must_use]
    pub fn new(settings: LevelSettings, seed: u64) -> Self {
        Self {
            settings,
            level: Level::new(),
            units: Vec::new(),
            buildings: Vec::new(),
            next_unit: 1,
            next_building: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick_index: 0,
        }
    }

    /// Builds a level from a validated scenario, registering every placement
    /// and building in declaration order.
    pub fn from_scenario(
        scenario: &Scenario,
        out_events: &mut Vec<Event>,
    ) -> Result<Self, ConfigError> {
        scenario.validate()?;
        let mut world = Self::new(scenario.level, scenario.seed);
        for placement in &scenario.placements {
            let team = scenario
                .team(placement.team)
                .ok_or(ConfigError::UnknownTeam(placement.team.get()))?;
            let stats = scenario
                .unit(&placement.unit)
                .ok_or_else(|| ConfigError::UnknownUnit(placement.unit.clone()))?;
            let unit = world.register_unit(team.clone(), stats.clone(), placement.spawn);
            out_events.push(Event::UnitRegistered {
                unit,
                team: team.id,
            });
        }
        for building in &scenario.buildings {
            if let Some(id) = world.register_building(building) {
                out_events.push(Event::BuildingRegistered { building: id });
            }
        }
        Ok(world)
    }

    fn register_unit(&mut self, team: TeamInfo, stats: UnitStats, spawn: UnitSpawn) -> UnitId {
        let id = UnitId::new(self.next_unit);
        self.next_unit = self.next_unit.saturating_add(1);
        info!(unit = id.get(), team = team.id.get(), class = %stats.name, "unit registered");
        self.level.turn.register_unit(&team, id);
        self.units.push(Unit::new(id, team.id, stats, spawn));
        id
    }

    fn deregister_unit(&mut self, unit: UnitId) -> bool {
        let Some(index) = self.unit_index(unit) else {
            return false;
        };
        let _ = self.units.remove(index);
        self.level.turn.deregister_unit(unit);
        info!(unit = unit.get(), "unit deregistered");
        true
    }

    fn register_building(&mut self, info: &BuildingInfo) -> Option<BuildingId> {
        let position = Vec3::new(info.position[0], 0.0, info.position[1]);
        if self
            .buildings
            .iter()
            .any(|building| building.position == position)
        {
            return None;
        }
        let id = BuildingId::new(self.next_building);
        self.next_building = self.next_building.saturating_add(1);
        self.buildings.push(Building {
            id,
            team: info.team,
            position,
            capture_range: info.capture_range,
        });
        Some(id)
    }

    fn unit_index(&self, unit: UnitId) -> Option<usize> {
        self.units.iter().position(|candidate| candidate.id() == unit)
    }

    fn unit_mut(&mut self, unit: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|candidate| candidate.id() == unit)
    }

    fn roster(&self) -> Vec<RosterEntry> {
        self.units.iter().map(Unit::roster_entry).collect()
    }

    fn is_active(&self, unit: UnitId) -> bool {
        self.level.turn.active_unit == Some(unit)
    }

    fn tick(
        &mut self,
        dt: Duration,
        input: &FrameInput,
        out_events: &mut Vec<Event>,
        display: &mut dyn DisplaySink,
    ) {
        self.tick_index = self.tick_index.saturating_add(1);

        let before = self.level.state();
        let roster = self.roster();
        self.level.step(roster, dt, input.advance_requested());
        if let Some(after) = self.level.state().filter(|after| Some(*after) != before) {
            debug!(tick = self.tick_index, from = ?before, to = ?after, "level state changed");
            out_events.push(Event::LevelStateChanged {
                from: before,
                to: after,
            });
        }
        self.flush_level(out_events, display);

        for index in 0..self.units.len() {
            let env = UnitEnv {
                level_state: self.level.state(),
                active_team: self.level.turn.active_team(),
                active_unit: self.level.turn.active_unit,
                settings: self.settings,
                roster: self.roster(),
                input: input.clone(),
                dt,
            };
            let unit = &mut self.units[index];
            let id = unit.id();
            let before = unit.state();
            let outputs = unit.step(env);
            if let Some(after) = unit.state().filter(|after| Some(*after) != before) {
                debug!(unit = id.get(), from = ?before, to = ?after, "unit state changed");
                out_events.push(Event::UnitStateChanged {
                    unit: id,
                    from: before,
                    to: after,
                });
            }
            self.apply_outputs(id, outputs, out_events, display);
        }
    }

    fn apply_outputs(
        &mut self,
        source: UnitId,
        outputs: Vec<UnitOutput>,
        out_events: &mut Vec<Event>,
        display: &mut dyn DisplaySink,
    ) {
        for output in outputs {
            match output {
                UnitOutput::ActiveUnit(unit) => self.level.turn.active_unit = unit,
                UnitOutput::TargetUnit(unit) => self.level.turn.target_unit = unit,
                UnitOutput::Attack {
                    target,
                    probability,
                    rolls,
                    power,
                } => {
                    let hits = combat::roll_hits(&mut self.rng, probability, rolls, power);
                    let accepted = self
                        .unit_mut(target)
                        .map_or(false, |unit| unit.take_damage(source, hits.clone()));
                    info!(
                        attacker = source.get(),
                        target = target.get(),
                        probability,
                        landed = hits.iter().filter(|hit| **hit > 0.0).count(),
                        accepted,
                        "attack resolved"
                    );
                    out_events.push(Event::AttackResolved {
                        attacker: source,
                        target,
                        probability,
                        hits,
                    });
                }
                UnitOutput::Event(event) => out_events.push(event),
                UnitOutput::Display(command) => display.submit(command),
            }
        }
    }

    fn flush_level(&mut self, out_events: &mut Vec<Event>, display: &mut dyn DisplaySink) {
        out_events.append(&mut self.level.turn.events);
        for command in self.level.turn.display.drain(..) {
            display.submit(command);
        }
    }

    /// Runs a menu command against the active unit and applies its outputs.
    fn command_active_unit(
        &mut self,
        unit: UnitId,
        out_events: &mut Vec<Event>,
        display: &mut dyn DisplaySink,
        command: fn(&mut Unit) -> bool,
    ) {
        if !self.is_active(unit) {
            return;
        }
        let Some(target) = self.unit_mut(unit) else {
            return;
        };
        if command(target) {
            let outputs = target.drain();
            self.apply_outputs(unit, outputs, out_events, display);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
    display: &mut dyn DisplaySink,
) {
    match command {
        Command::Tick { dt, input } => world.tick(dt, &input, out_events, display),
        Command::RegisterUnit { team, stats, spawn } => {
            let team_id = team.id;
            let unit = world.register_unit(team, stats, spawn);
            out_events.push(Event::UnitRegistered {
                unit,
                team: team_id,
            });
        }
        Command::DeregisterUnit { unit } => {
            if world.deregister_unit(unit) {
                out_events.push(Event::UnitDeregistered { unit });
            }
        }
        Command::RegisterBuilding { building } => {
            if let Some(id) = world.register_building(&building) {
                out_events.push(Event::BuildingRegistered { building: id });
            }
        }
        Command::DeregisterBuilding { building } => {
            let before = world.buildings.len();
            world.buildings.retain(|candidate| candidate.id != building);
            if world.buildings.len() != before {
                out_events.push(Event::BuildingDeregistered { building });
            }
        }
        Command::FindNextAvailableUnit => {
            world.level.turn.roster = world.roster();
            world.level.turn.find_next_available_unit();
            world.flush_level(out_events, display);
        }
        Command::ProgressTurn => {
            world.level.turn.roster = world.roster();
            world.level.progress_turn();
            world.flush_level(out_events, display);
        }
        Command::CancelMove { unit } => {
            world.command_active_unit(unit, out_events, display, Unit::cancel_move);
        }
        Command::ChangeAltitude { unit, delta } => {
            if !world.is_active(unit) {
                return;
            }
            let settings = world.settings;
            if let Some(target) = world.unit_mut(unit) {
                target.actor.env.settings = settings;
                if target.change_altitude(delta) {
                    let outputs = target.drain();
                    world.apply_outputs(unit, outputs, out_events, display);
                }
            }
        }
        Command::UndoMove { unit } => {
            world.command_active_unit(unit, out_events, display, Unit::undo_move);
        }
        Command::SkipAttack { unit } => {
            world.command_active_unit(unit, out_events, display, Unit::skip_attack);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use aerial_tactics_core::{
        LevelSettings, LevelState, TeamId, TeamInfo, UnitId, UnitState, UnitStats,
    };
    use glam::Vec3;

    use super::{roster, ActionSnapshot, Building, Transform, World};

    /// Current turn state of the level, once the level has started.
    #[must_use]
    pub fn level_state(world: &World) -> Option<LevelState> {
        world.level.state()
    }

    /// Global turn number, starting at one.
    #[must_use]
    pub fn current_turn(world: &World) -> u32 {
        world.level.turn.current_turn
    }

    /// Index of the acting team in priority order.
    #[must_use]
    pub fn active_team_index(world: &World) -> usize {
        world.level.turn.active_team_index
    }

    /// Team currently acting.
    #[must_use]
    pub fn active_team(world: &World) -> Option<&TeamInfo> {
        world.level.turn.teams.get(world.level.turn.active_team_index)
    }

    /// Unit currently selected for acting or previewing.
    #[must_use]
    pub fn active_unit(world: &World) -> Option<UnitId> {
        world.level.turn.active_unit
    }

    /// Unit currently previewed as an attack target.
    #[must_use]
    pub fn target_unit(world: &World) -> Option<UnitId> {
        world.level.turn.target_unit
    }

    /// Altitude configuration of the level.
    #[must_use]
    pub fn settings(world: &World) -> &LevelSettings {
        &world.settings
    }

    /// World units between two altitude levels.
    #[must_use]
    pub fn altitude_height(world: &World) -> f32 {
        world.settings.altitude_height
    }

    /// Registered teams in acting order.
    #[must_use]
    pub fn teams(world: &World) -> &[TeamInfo] {
        &world.level.turn.teams
    }

    /// Units registered under `team`, in registration order.
    #[must_use]
    pub fn team_units(world: &World, team: TeamId) -> Vec<UnitId> {
        world.level.turn.team_units(team).to_vec()
    }

    /// Action state of `unit`, once it has started.
    #[must_use]
    pub fn unit_state(world: &World, unit: UnitId) -> Option<UnitState> {
        world
            .units
            .iter()
            .find(|candidate| candidate.id() == unit)
            .and_then(|candidate| candidate.state())
    }

    /// Snapshot of a single unit.
    #[must_use]
    pub fn unit_view(world: &World, unit: UnitId) -> Option<UnitView> {
        world
            .units
            .iter()
            .find(|candidate| candidate.id() == unit)
            .map(view_of)
    }

    /// Snapshots of every unit in registration order.
    #[must_use]
    pub fn unit_views(world: &World) -> Vec<UnitView> {
        world.units.iter().map(view_of).collect()
    }

    /// Units whose hitbox overlaps the sphere of `radius` around `point`.
    #[must_use]
    pub fn units_in_point(world: &World, point: Vec3, radius: f32) -> Vec<UnitId> {
        roster::units_in_point(&world.roster(), point, radius)
    }

    /// Registered buildings in registration order.
    #[must_use]
    pub fn buildings(world: &World) -> &[Building] {
        &world.buildings
    }

    fn view_of(unit: &super::Unit) -> UnitView {
        let actor = &unit.actor;
        UnitView {
            id: actor.id,
            team: actor.team,
            state: unit.state(),
            stats: actor.stats.clone(),
            pre: actor.pre,
            post: actor.post,
            transform: actor.transform,
            selected_altitude: actor.movement.selected_altitude,
        }
    }

    /// Immutable representation of a single unit used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct UnitView {
        /// Unique identifier assigned to the unit.
        pub id: UnitId,
        /// Team the unit fights for.
        pub team: TeamId,
        /// Current action state, once started.
        pub state: Option<UnitState>,
        /// Static stats of the unit.
        pub stats: UnitStats,
        /// Snapshot committed at the start of the turn.
        pub pre: ActionSnapshot,
        /// Snapshot the unit is heading for.
        pub post: ActionSnapshot,
        /// Pose the unit is presented at.
        pub transform: Transform,
        /// Altitude chosen in the move menu.
        pub selected_altitude: i32,
    }
}
