//! Per-unit action controller and the snapshots it maintains.

use std::time::Duration;

use aerial_tactics_core::{
    range::lerp, DisplayCommand, Event, Frame, FrameInput, Indicator, InputQuery, Layer,
    LevelSettings, LevelState, MoveInput, Path, StateInfo, StateMachine, TeamId, TurnPath, UnitId,
    UnitSpawn, UnitState, UnitStats,
};
use glam::{Quat, Vec3};

use crate::{
    maneuver::{AttackSelection, MoveSelection},
    reaction::{DamageReveal, Fall},
    roster::RosterEntry,
    trail::TrailHistory,
};

/// Bank angle at full left steer when a unit spawns.
const SPAWN_TILT: f32 = 70.0;
/// Number of trail segments handed to the display.
const TRAIL_WINDOW: usize = 3;

const ALL_LAYERS: [Layer; 7] = [
    Layer::CurrentMoveFull,
    Layer::CurrentMoveArea,
    Layer::NextMoveFull,
    Layer::NextMoveArea,
    Layer::MovePath,
    Layer::AttackArea,
    Layer::ProjectedModel,
];

/// Flight state of a unit at a turn boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionSnapshot {
    /// Ground position.
    pub position: Vec3,
    /// Heading on the ground plane.
    pub rotation: Quat,
    /// Altitude level.
    pub altitude: i32,
    /// Speed fraction within the unit's envelope.
    pub speed: f32,
    /// Steer fraction within the unit's envelope.
    pub steer: f32,
    /// Path flown to reach this snapshot.
    pub path: TurnPath,
    /// Bank angle in degrees.
    pub tilt: f32,
    /// Remaining health.
    pub health: f32,
}

impl ActionSnapshot {
    fn from_spawn(spawn: &UnitSpawn, stats: &UnitStats) -> Self {
        let frame = spawn.frame();
        let input = MoveInput::new(spawn.speed, spawn.steer);
        Self {
            position: frame.position,
            rotation: frame.rotation,
            altitude: spawn.altitude,
            speed: spawn.speed,
            steer: spawn.steer,
            path: TurnPath::from_result(stats.move_area.evaluate(input), 0.0),
            tilt: lerp(SPAWN_TILT, -SPAWN_TILT, spawn.steer),
            health: stats.max_health * spawn.health,
        }
    }

    /// Ground frame of the snapshot.
    pub(crate) fn frame(&self) -> Frame {
        Frame::new(self.position, self.rotation)
    }

    /// Envelope input that produced the snapshot.
    pub(crate) fn input(&self) -> MoveInput {
        MoveInput::new(self.speed, self.steer)
    }
}

/// Pose a unit is presented at.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    /// Ground position; drops below zero while falling.
    pub position: Vec3,
    /// Heading on the ground plane.
    pub rotation: Quat,
    /// Height above the ground position.
    pub height: f32,
    /// Bank angle in degrees.
    pub tilt: f32,
}

impl Transform {
    /// Pose resting at a snapshot.
    pub(crate) fn at_rest(snapshot: &ActionSnapshot, settings: &LevelSettings) -> Self {
        Self {
            position: snapshot.position,
            rotation: snapshot.rotation,
            height: settings.height_of(snapshot.altitude),
            tilt: snapshot.tilt,
        }
    }

    /// Point in world space the unit occupies.
    #[must_use]
    pub fn world_point(&self) -> Vec3 {
        self.position + Vec3::Y * self.height
    }

    /// Heading as a unit vector.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// Level facts a unit reads while stepping.
#[derive(Clone, Debug, Default)]
pub(crate) struct UnitEnv {
    pub(crate) level_state: Option<LevelState>,
    pub(crate) active_team: Option<TeamId>,
    pub(crate) active_unit: Option<UnitId>,
    pub(crate) settings: LevelSettings,
    pub(crate) roster: Vec<RosterEntry>,
    pub(crate) input: FrameInput,
    pub(crate) dt: Duration,
}

/// Requests a unit hands back to the world after stepping.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UnitOutput {
    ActiveUnit(Option<UnitId>),
    TargetUnit(Option<UnitId>),
    Attack {
        target: UnitId,
        probability: f32,
        rolls: u32,
        power: f32,
    },
    Event(Event),
    Display(DisplayCommand),
}

/// Context the unit machine operates on.
#[derive(Debug)]
pub(crate) struct UnitActor {
    pub(crate) id: UnitId,
    pub(crate) team: TeamId,
    pub(crate) stats: UnitStats,
    spawn: UnitSpawn,
    pub(crate) pre: ActionSnapshot,
    pub(crate) post: ActionSnapshot,
    pub(crate) transform: Transform,
    pub(crate) trail: TrailHistory,
    pub(crate) movement: MoveSelection,
    pub(crate) attack: AttackSelection,
    pub(crate) damage: DamageReveal,
    pub(crate) fall: Fall,
    pub(crate) hovered: bool,
    pub(crate) env: UnitEnv,
    outputs: Vec<UnitOutput>,
}

impl UnitActor {
    fn new(id: UnitId, team: TeamId, stats: UnitStats, spawn: UnitSpawn) -> Self {
        let snapshot = ActionSnapshot::from_spawn(&spawn, &stats);
        Self {
            id,
            team,
            spawn,
            pre: snapshot,
            post: snapshot,
            transform: Transform::default(),
            trail: TrailHistory::seeded(Path::Turn(snapshot.path), snapshot.tilt),
            movement: MoveSelection::default(),
            attack: AttackSelection::default(),
            damage: DamageReveal::default(),
            fall: Fall::default(),
            hovered: false,
            env: UnitEnv::default(),
            outputs: Vec::new(),
            stats,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.env.active_unit == Some(self.id)
    }

    pub(crate) fn height_of(&self, altitude: i32) -> f32 {
        self.env.settings.height_of(altitude)
    }

    pub(crate) fn set_active_unit(&mut self, unit: Option<UnitId>) {
        self.env.active_unit = unit;
        self.outputs.push(UnitOutput::ActiveUnit(unit));
    }

    pub(crate) fn set_target_unit(&mut self, unit: Option<UnitId>) {
        self.outputs.push(UnitOutput::TargetUnit(unit));
    }

    pub(crate) fn request_attack(&mut self, target: UnitId, probability: f32) {
        self.outputs.push(UnitOutput::Attack {
            target,
            probability,
            rolls: self.stats.attack_rolls,
            power: self.stats.attack_power,
        });
    }

    pub(crate) fn report(&mut self, event: Event) {
        self.outputs.push(UnitOutput::Event(event));
    }

    pub(crate) fn display(&mut self, command: DisplayCommand) {
        self.outputs.push(UnitOutput::Display(command));
    }

    pub(crate) fn show(&mut self, layer: Layer, visible: bool) {
        self.display(DisplayCommand::SetVisible {
            unit: self.id,
            layer,
            visible,
        });
    }

    pub(crate) fn hide_layers(&mut self) {
        for layer in ALL_LAYERS {
            self.show(layer, false);
        }
    }

    pub(crate) fn indicate(&mut self, indicator: Indicator, done: bool) {
        self.display(DisplayCommand::Indicator {
            unit: self.id,
            indicator,
            done,
        });
    }

    pub(crate) fn rest_at_pre(&mut self) {
        self.transform = Transform::at_rest(&self.pre, &self.env.settings);
    }

    /// Draws the envelope reachable from the committed snapshot.
    pub(crate) fn show_envelope(&mut self) {
        let height = self.height_of(self.pre.altitude);
        let full = self.stats.move_area;
        let reachable = full.sub_area(self.pre.input(), self.stats.move_adjust);
        for (layer, area) in [
            (Layer::CurrentMoveFull, full),
            (Layer::CurrentMoveArea, reachable),
        ] {
            self.display(DisplayCommand::MoveArea {
                unit: self.id,
                layer,
                area,
                anchor: Frame::IDENTITY,
                height,
            });
            self.show(layer, true);
        }
    }

    pub(crate) fn publish_trails(&mut self, progress: f32) {
        let skip = self.trail.len().saturating_sub(TRAIL_WINDOW);
        let (paths, tilts) = self.trail.window(skip, TRAIL_WINDOW);
        self.display(DisplayCommand::Trails {
            unit: self.id,
            paths,
            tilts,
            progress,
        });
    }

    /// Toggles the hover overlay when the pointer enters or leaves the unit.
    pub(crate) fn update_hover(&mut self) {
        let hovering = self.env.input.is_hovering(self.id);
        if hovering == self.hovered {
            return;
        }
        self.hovered = hovering;
        if hovering {
            self.show_envelope();
            self.indicate(Indicator::Normal, false);
        } else {
            self.show(Layer::CurrentMoveFull, false);
            self.show(Layer::CurrentMoveArea, false);
            self.indicate(Indicator::Mini, false);
        }
    }

    fn follow_level_solidify(&mut self) -> Option<UnitState> {
        (self.env.level_state == Some(LevelState::Solidify)).then_some(UnitState::Solidify)
    }

    fn initialize_entry(&mut self) {
        self.post = ActionSnapshot::from_spawn(&self.spawn, &self.stats);
        self.pre = self.post;
        self.trail = TrailHistory::seeded(Path::Turn(self.post.path), self.post.tilt);
        self.rest_at_pre();
        self.display(DisplayCommand::Health {
            unit: self.id,
            health: self.post.health,
        });
        self.display(DisplayCommand::Altitude {
            unit: self.id,
            altitude: self.post.altitude,
        });
        self.display(DisplayCommand::Marker {
            unit: self.id,
            marker: aerial_tactics_core::Marker::Normal,
        });
        self.indicate(Indicator::Mini, false);
        self.publish_trails(1.0);
    }

    fn solidify_entry(&mut self) {
        self.pre = self.post;
        self.rest_at_pre();
        self.hovered = false;
        self.hide_layers();
        self.indicate(Indicator::Mini, false);
        self.display(DisplayCommand::Altitude {
            unit: self.id,
            altitude: self.pre.altitude,
        });
        self.publish_trails(1.0);
    }

    fn solidify_transition(&mut self) -> Option<UnitState> {
        if self.env.level_state != Some(LevelState::TeamAction) {
            return None;
        }
        if self.env.active_team == Some(self.team) {
            Some(UnitState::Idle)
        } else {
            Some(UnitState::Wait)
        }
    }

    fn idle_entry(&mut self) {
        self.rest_at_pre();
        self.hovered = false;
        self.indicate(Indicator::Mini, false);
    }

    fn idle_body(&mut self) {
        self.update_hover();
        if self.env.active_unit.is_none() && self.env.input.is_selected(self.id) {
            self.set_active_unit(Some(self.id));
        }
    }

    fn idle_transition(&mut self) -> Option<UnitState> {
        self.is_active().then_some(UnitState::MoveMenu)
    }

    fn idle_exit(&mut self) {
        self.hovered = false;
        self.show(Layer::CurrentMoveFull, false);
        self.show(Layer::CurrentMoveArea, false);
    }

    fn done_entry(&mut self) {
        self.indicate(Indicator::Mini, true);
    }
}

/// A unit and the machine sequencing its actions.
#[derive(Debug)]
pub(crate) struct Unit {
    machine: StateMachine<UnitState, UnitActor>,
    pub(crate) actor: UnitActor,
}

impl Unit {
    pub(crate) fn new(id: UnitId, team: TeamId, stats: UnitStats, spawn: UnitSpawn) -> Self {
        Self {
            machine: unit_machine(),
            actor: UnitActor::new(id, team, stats, spawn),
        }
    }

    pub(crate) fn id(&self) -> UnitId {
        self.actor.id
    }

    /// State whose bodies ran on the last step.
    pub(crate) fn state(&self) -> Option<UnitState> {
        self.machine.current()
    }

    /// Runs one machine step and returns what the unit asked of the world.
    pub(crate) fn step(&mut self, env: UnitEnv) -> Vec<UnitOutput> {
        self.actor.env = env;
        self.machine.run(&mut self.actor);
        self.drain()
    }

    /// Outputs queued outside of a step.
    pub(crate) fn drain(&mut self) -> Vec<UnitOutput> {
        std::mem::take(&mut self.actor.outputs)
    }

    pub(crate) fn roster_entry(&self) -> RosterEntry {
        RosterEntry {
            unit: self.actor.id,
            team: self.actor.team,
            state: self.state().unwrap_or(UnitState::Initialize),
            transform: self.actor.transform,
            altitude: self.actor.pre.altitude,
            hitbox_radius: self.actor.stats.hitbox_radius,
            cruise_distance: self.actor.stats.move_area.distances.lerp(0.5),
        }
    }

    /// Queues incoming hits; only a waiting unit can be damaged.
    pub(crate) fn take_damage(&mut self, source: UnitId, hits: Vec<f32>) -> bool {
        if self.state() != Some(UnitState::Wait) || self.actor.damage.received.is_some() {
            return false;
        }
        self.actor.damage.receive(source, hits);
        true
    }

    pub(crate) fn cancel_move(&mut self) -> bool {
        if self.state() != Some(UnitState::MoveMenu) {
            return false;
        }
        self.actor.set_active_unit(None);
        true
    }

    pub(crate) fn change_altitude(&mut self, delta: i32) -> bool {
        if self.state() != Some(UnitState::MoveMenu) {
            return false;
        }
        self.actor.change_selected_altitude(delta);
        true
    }

    /// Whether the unit still has a committed move and no attack decided.
    ///
    /// The machine state lags menu commands by a step, so the selections are
    /// checked as well.
    fn has_open_attack_menu(&self) -> bool {
        self.state() == Some(UnitState::AttackMenu)
            && self.actor.movement.decided.is_some()
            && self.actor.attack.decided.is_none()
    }

    pub(crate) fn undo_move(&mut self) -> bool {
        if !self.has_open_attack_menu() {
            return false;
        }
        self.actor.undo_move();
        true
    }

    pub(crate) fn skip_attack(&mut self) -> bool {
        if !self.has_open_attack_menu() {
            return false;
        }
        self.actor.skip_attack();
        true
    }
}

fn unit_machine() -> StateMachine<UnitState, UnitActor> {
    let follow_level = StateInfo::new().transition(UnitActor::follow_level_solidify);

    let mut machine = StateMachine::new();
    machine.add_state(
        UnitState::Initialize,
        StateInfo::new().entry(UnitActor::initialize_entry),
    );
    machine.add_state(UnitState::Initialize, follow_level);
    machine.add_state(
        UnitState::Solidify,
        StateInfo::new()
            .entry(UnitActor::solidify_entry)
            .transition(UnitActor::solidify_transition),
    );
    machine.add_state(
        UnitState::Idle,
        StateInfo::new()
            .entry(UnitActor::idle_entry)
            .body(UnitActor::idle_body)
            .transition(UnitActor::idle_transition)
            .exit(UnitActor::idle_exit),
    );
    machine.add_state(UnitState::Idle, follow_level);
    machine.add_state(
        UnitState::MoveMenu,
        StateInfo::new()
            .entry(UnitActor::move_menu_entry)
            .body(UnitActor::move_menu_body)
            .transition(UnitActor::move_menu_transition)
            .exit(UnitActor::move_menu_exit),
    );
    machine.add_state(
        UnitState::MoveAnimation,
        StateInfo::new()
            .entry(UnitActor::move_animation_entry)
            .body(UnitActor::move_animation_body)
            .transition(UnitActor::move_animation_transition)
            .exit(UnitActor::move_animation_exit),
    );
    machine.add_state(
        UnitState::AttackMenu,
        StateInfo::new()
            .entry(UnitActor::attack_menu_entry)
            .body(UnitActor::attack_menu_body)
            .transition(UnitActor::attack_menu_transition)
            .exit(UnitActor::attack_menu_exit),
    );
    machine.add_state(
        UnitState::AttackAnimation,
        StateInfo::new()
            .entry(UnitActor::attack_animation_entry)
            .body(UnitActor::attack_animation_body)
            .transition(UnitActor::attack_animation_transition)
            .exit(UnitActor::attack_animation_exit),
    );
    machine.add_state(
        UnitState::Done,
        StateInfo::new().entry(UnitActor::done_entry),
    );
    machine.add_state(UnitState::Done, follow_level);
    machine.add_state(
        UnitState::Wait,
        StateInfo::new()
            .entry(UnitActor::wait_entry)
            .body(UnitActor::wait_body)
            .transition(UnitActor::wait_transition),
    );
    machine.add_state(
        UnitState::AttackPrediction,
        StateInfo::new()
            .entry(UnitActor::attack_prediction_entry)
            .body(UnitActor::attack_prediction_body)
            .transition(UnitActor::attack_prediction_transition)
            .exit(UnitActor::attack_prediction_exit),
    );
    machine.add_state(
        UnitState::DamageAnimation,
        StateInfo::new()
            .entry(UnitActor::damage_animation_entry)
            .body(UnitActor::damage_animation_body)
            .transition(UnitActor::damage_animation_transition)
            .exit(UnitActor::damage_animation_exit),
    );
    machine.add_state(
        UnitState::DownAnimation,
        StateInfo::new()
            .entry(UnitActor::down_animation_entry)
            .body(UnitActor::down_animation_body)
            .transition(UnitActor::down_animation_transition)
            .exit(UnitActor::down_animation_exit),
    );
    machine.add_state(
        UnitState::Downed,
        StateInfo::new().entry(UnitActor::downed_entry),
    );
    machine.set_initial_state(UnitState::Initialize);
    machine
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit::new(
            UnitId::new(1),
            TeamId::new(1),
            UnitStats::default(),
            UnitSpawn {
                position: [3.0, 4.0],
                health: 0.5,
                steer: 0.0,
                ..UnitSpawn::default()
            },
        )
    }

    fn env(level_state: LevelState, active_team: u32) -> UnitEnv {
        UnitEnv {
            level_state: Some(level_state),
            active_team: Some(TeamId::new(active_team)),
            dt: Duration::from_millis(100),
            ..UnitEnv::default()
        }
    }

    #[test]
    fn spawn_snapshot_follows_the_envelope() {
        let mut unit = unit();
        let _ = unit.step(env(LevelState::Initialize, 1));

        let post = unit.actor.post;
        assert_eq!(post.health, 50.0);
        assert_eq!(post.tilt, SPAWN_TILT);
        assert_eq!(post.path.distance(), 12.5);
        assert_eq!(post.path.azimuth(), -20.0);
        assert_eq!(unit.actor.transform.height, 20.0);
        assert_eq!(unit.actor.transform.position, Vec3::new(3.0, 0.0, 4.0));
    }

    #[test]
    fn follows_level_into_solidify_and_team_action() {
        let mut unit = unit();
        let _ = unit.step(env(LevelState::Initialize, 1));
        let _ = unit.step(env(LevelState::Solidify, 1));
        assert_eq!(unit.state(), Some(UnitState::Initialize));
        let _ = unit.step(env(LevelState::Solidify, 1));
        assert_eq!(unit.state(), Some(UnitState::Solidify));

        let _ = unit.step(env(LevelState::TeamAction, 2));
        let _ = unit.step(env(LevelState::TeamAction, 2));
        assert_eq!(unit.state(), Some(UnitState::Wait));
    }

    #[test]
    fn selection_claims_the_active_unit() {
        let mut unit = unit();
        for state in [
            LevelState::Initialize,
            LevelState::Solidify,
            LevelState::Solidify,
            LevelState::TeamAction,
            LevelState::TeamAction,
        ] {
            let _ = unit.step(env(state, 1));
        }
        assert_eq!(unit.state(), Some(UnitState::Idle));

        let mut selecting = env(LevelState::TeamAction, 1);
        selecting.input.selected = Some(UnitId::new(1));
        let outputs = unit.step(selecting);
        assert!(outputs.contains(&UnitOutput::ActiveUnit(Some(UnitId::new(1)))));

        let mut active = env(LevelState::TeamAction, 1);
        active.active_unit = Some(UnitId::new(1));
        let _ = unit.step(active);
        assert_eq!(unit.state(), Some(UnitState::MoveMenu));
    }

    #[test]
    fn damage_is_only_accepted_while_waiting() {
        let mut unit = unit();
        assert!(!unit.take_damage(UnitId::new(2), vec![5.0]));
        for state in [
            LevelState::Initialize,
            LevelState::Solidify,
            LevelState::Solidify,
            LevelState::TeamAction,
            LevelState::TeamAction,
        ] {
            let _ = unit.step(env(state, 2));
        }
        assert!(unit.take_damage(UnitId::new(2), vec![5.0]));
        assert!(!unit.take_damage(UnitId::new(2), vec![5.0]));
    }

    #[test]
    fn menu_commands_require_matching_states() {
        let mut unit = unit();
        assert!(!unit.cancel_move());
        assert!(!unit.change_altitude(1));
        assert!(!unit.undo_move());
        assert!(!unit.skip_attack());
        assert!(unit.drain().is_empty());
    }
}
