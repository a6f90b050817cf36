//! Turn sequencing shared by every unit in the level.

use std::{collections::HashMap, time::Duration};

use aerial_tactics_core::{
    DisplayCommand, Event, LevelState, StateInfo, StateMachine, TeamId, TeamInfo, UnitId,
    UnitState,
};
use tracing::{debug, info};

use crate::roster::RosterEntry;

/// Announcement length when the next team acts within the same turn.
const TEAM_ANNOUNCEMENT: Duration = Duration::from_millis(1667);
/// Announcement length when the turn number also changes.
const TURN_ANNOUNCEMENT: Duration = Duration::from_millis(2333);

/// Level machine paired with the turn bookkeeping it drives.
#[derive(Debug)]
pub(crate) struct Level {
    machine: StateMachine<LevelState, TurnOrder>,
    pub(crate) turn: TurnOrder,
}

impl Level {
    pub(crate) fn new() -> Self {
        Self {
            machine: level_machine(),
            turn: TurnOrder::default(),
        }
    }

    /// State whose bodies ran on the last step.
    pub(crate) fn state(&self) -> Option<LevelState> {
        self.machine.current()
    }

    /// Runs one machine step against a fresh roster.
    pub(crate) fn step(&mut self, roster: Vec<RosterEntry>, dt: Duration, advance: bool) {
        self.turn.roster = roster;
        self.turn.dt = dt;
        self.turn.advance_requested = advance;
        self.machine.run(&mut self.turn);
        self.turn.advance_requested = false;
    }

    /// Hands the turn on, but only while a team is acting.
    pub(crate) fn progress_turn(&mut self) {
        if self.state() == Some(LevelState::TeamAction) {
            self.turn.progress_turn();
        }
    }
}

/// Registry of teams and units plus the turn counters.
#[derive(Debug, Default)]
pub(crate) struct TurnOrder {
    pub(crate) current_turn: u32,
    pub(crate) active_team_index: usize,
    pub(crate) active_unit: Option<UnitId>,
    pub(crate) target_unit: Option<UnitId>,
    pub(crate) teams: Vec<TeamInfo>,
    team_units: HashMap<TeamId, Vec<UnitId>>,
    pub(crate) roster: Vec<RosterEntry>,
    dt: Duration,
    advance_requested: bool,
    announcement_elapsed: Duration,
    announcement_duration: Duration,
    acting: (u32, usize),
    pub(crate) events: Vec<Event>,
    pub(crate) display: Vec<DisplayCommand>,
}

impl TurnOrder {
    /// Team currently acting.
    pub(crate) fn active_team(&self) -> Option<TeamId> {
        self.teams.get(self.active_team_index).map(|team| team.id)
    }

    /// Units of `team` in registration order.
    pub(crate) fn team_units(&self, team: TeamId) -> &[UnitId] {
        self.team_units.get(&team).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adds `unit` under `team`, registering the team on first sight.
    pub(crate) fn register_unit(&mut self, team: &TeamInfo, unit: UnitId) {
        if !self.team_units.contains_key(&team.id) {
            self.teams.push(team.clone());
            self.teams.sort_by_key(|team| team.priority);
            debug!(team = team.id.get(), name = %team.name, "team registered");
        }
        self.team_units.entry(team.id).or_default().push(unit);
    }

    /// Removes `unit`, dropping its team once the team is empty.
    pub(crate) fn deregister_unit(&mut self, unit: UnitId) {
        let Some(team) = self
            .team_units
            .iter()
            .find(|(_, units)| units.contains(&unit))
            .map(|(team, _)| *team)
        else {
            return;
        };

        let now_empty = match self.team_units.get_mut(&team) {
            Some(units) => {
                units.retain(|candidate| *candidate != unit);
                units.is_empty()
            }
            None => false,
        };
        if now_empty {
            let _ = self.team_units.remove(&team);
            self.teams.retain(|info| info.id != team);
            if self.active_team_index >= self.teams.len() {
                self.active_team_index = 0;
            }
            debug!(team = team.get(), "team deregistered");
        }

        if self.active_unit == Some(unit) {
            self.active_unit = None;
        }
        if self.target_unit == Some(unit) {
            self.target_unit = None;
        }
    }

    /// Picks the next idle unit of the active team after the active unit.
    pub(crate) fn find_next_available_unit(&mut self) {
        let Some(team) = self.active_team() else {
            return;
        };
        let units = self.team_units(team);
        if units.is_empty() {
            return;
        }

        let start = self
            .active_unit
            .and_then(|active| units.iter().position(|unit| *unit == active))
            .map_or(0, |index| index + 1);
        let next = (0..units.len())
            .map(|offset| units[(start + offset) % units.len()])
            .find_map(|unit| {
                self.roster
                    .iter()
                    .find(|entry| entry.unit == unit && entry.state == UnitState::Idle)
            })
            .copied();

        if let Some(entry) = next {
            self.active_unit = Some(entry.unit);
            self.display.push(DisplayCommand::FocusCamera {
                point: entry.focus_point(),
            });
        }
    }

    /// Moves to the next team once every unit is settled.
    ///
    /// Active-team units must have finished their turn and every other unit
    /// must be standing by. Teams whose units are all down are skipped.
    pub(crate) fn progress_turn(&mut self) {
        let Some(active) = self.active_team() else {
            return;
        };
        let settled = self.roster.iter().all(|entry| {
            if entry.team == active {
                entry.state.has_finished_turn()
            } else {
                entry.state.is_standing_by()
            }
        });
        if !settled {
            return;
        }

        for _ in 0..self.teams.len() {
            self.active_team_index += 1;
            if self.active_team_index >= self.teams.len() {
                self.active_team_index = 0;
                self.current_turn += 1;
            }
            if !self.team_is_down(self.active_team_index) {
                break;
            }
        }

        info!(
            turn = self.current_turn,
            team_index = self.active_team_index,
            "turn progressed"
        );
        self.events.push(Event::TurnProgressed {
            turn: self.current_turn,
            team_index: self.active_team_index,
        });
    }

    fn team_is_down(&self, index: usize) -> bool {
        let Some(team) = self.teams.get(index) else {
            return true;
        };
        self.team_units(team.id).iter().all(|unit| {
            self.roster
                .iter()
                .find(|entry| entry.unit == *unit)
                .map_or(true, |entry| entry.state.is_down())
        })
    }

    fn initialize_entry(&mut self) {
        self.current_turn = 1;
        self.active_team_index = 0;
    }

    fn initialize_transition(&mut self) -> Option<LevelState> {
        Some(LevelState::Solidify)
    }

    fn solidify_transition(&mut self) -> Option<LevelState> {
        self.roster
            .iter()
            .all(|entry| matches!(entry.state, UnitState::Solidify | UnitState::Downed))
            .then_some(LevelState::PreTeamAction)
    }

    fn pre_team_action_entry(&mut self) {
        let previous_turn = if self.active_team_index == 0 && self.current_turn != 1 {
            self.current_turn - 1
        } else {
            self.current_turn
        };
        self.announcement_elapsed = Duration::ZERO;
        self.announcement_duration = if previous_turn == self.current_turn {
            TEAM_ANNOUNCEMENT
        } else {
            TURN_ANNOUNCEMENT
        };
        if let Some(team) = self.active_team() {
            self.display.push(DisplayCommand::TurnAnnouncement {
                team,
                previous_turn,
                turn: self.current_turn,
            });
        }
    }

    fn pre_team_action_body(&mut self) {
        self.announcement_elapsed = self.announcement_elapsed.saturating_add(self.dt);
    }

    fn pre_team_action_transition(&mut self) -> Option<LevelState> {
        (self.announcement_elapsed > self.announcement_duration).then_some(LevelState::TeamAction)
    }

    fn team_action_entry(&mut self) {
        self.acting = (self.current_turn, self.active_team_index);
        if let Some(team) = self.active_team() {
            info!(turn = self.current_turn, team = team.get(), "team turn started");
            self.events.push(Event::TurnStarted {
                turn: self.current_turn,
                team,
            });
        }
    }

    fn team_action_body(&mut self) {
        if self.advance_requested {
            self.find_next_available_unit();
            self.progress_turn();
        }
    }

    // Comparing the turn as well lets a lone team wrap back onto itself.
    fn team_action_transition(&mut self) -> Option<LevelState> {
        let turn = (self.current_turn, self.active_team_index);
        (turn != self.acting).then_some(LevelState::Solidify)
    }
}

fn level_machine() -> StateMachine<LevelState, TurnOrder> {
    let mut machine = StateMachine::new();
    machine.add_state(
        LevelState::Initialize,
        StateInfo::new()
            .entry(TurnOrder::initialize_entry)
            .transition(TurnOrder::initialize_transition),
    );
    machine.add_state(
        LevelState::Solidify,
        StateInfo::new().transition(TurnOrder::solidify_transition),
    );
    machine.add_state(
        LevelState::PreTeamAction,
        StateInfo::new()
            .entry(TurnOrder::pre_team_action_entry)
            .body(TurnOrder::pre_team_action_body)
            .transition(TurnOrder::pre_team_action_transition),
    );
    machine.add_state(
        LevelState::TeamAction,
        StateInfo::new()
            .entry(TurnOrder::team_action_entry)
            .body(TurnOrder::team_action_body)
            .transition(TurnOrder::team_action_transition),
    );
    // Nothing transitions into these yet; victory is not decided in-level.
    machine.add_state(LevelState::EnvironmentalAction, StateInfo::new());
    machine.add_state(LevelState::Ended, StateInfo::new());
    machine.set_initial_state(LevelState::Initialize);
    machine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Transform;
    use glam::{Quat, Vec3};

    const STEP: Duration = Duration::from_millis(100);

    #[test]
    fn teams_are_ordered_by_priority() {
        let mut order = TurnOrder::default();
        order.register_unit(&team(2, 5), UnitId::new(1));
        order.register_unit(&team(1, -1), UnitId::new(2));
        order.register_unit(&team(3, 5), UnitId::new(3));

        let ids: Vec<u32> = order.teams.iter().map(|team| team.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_team_is_dropped() {
        let mut order = TurnOrder::default();
        order.register_unit(&team(1, 0), UnitId::new(1));
        order.register_unit(&team(2, 1), UnitId::new(2));
        order.active_unit = Some(UnitId::new(2));

        order.deregister_unit(UnitId::new(2));
        assert_eq!(order.teams.len(), 1);
        assert_eq!(order.active_unit, None);
        assert!(order.team_units(TeamId::new(2)).is_empty());
    }

    #[test]
    fn progress_waits_for_unfinished_units() {
        let mut order = two_teams();
        order.roster = vec![entry(1, 1, UnitState::AttackMenu), entry(2, 2, UnitState::Wait)];
        order.progress_turn();
        assert_eq!(order.active_team_index, 0);
        assert!(order.events.is_empty());
    }

    #[test]
    fn progress_requires_other_teams_to_stand_by() {
        let mut order = two_teams();
        order.roster = vec![
            entry(1, 1, UnitState::Done),
            entry(2, 2, UnitState::AttackPrediction),
        ];
        order.progress_turn();
        assert_eq!(order.active_team_index, 0);
    }

    #[test]
    fn progress_wraps_into_the_next_turn() {
        let mut order = two_teams();
        order.roster = vec![entry(1, 1, UnitState::Done), entry(2, 2, UnitState::Wait)];
        order.progress_turn();
        assert_eq!((order.current_turn, order.active_team_index), (1, 1));

        order.roster = vec![entry(1, 1, UnitState::Wait), entry(2, 2, UnitState::Done)];
        order.progress_turn();
        assert_eq!((order.current_turn, order.active_team_index), (2, 0));
        assert_eq!(
            order.events.last(),
            Some(&Event::TurnProgressed {
                turn: 2,
                team_index: 0
            })
        );
    }

    #[test]
    fn downed_teams_are_skipped() {
        let mut order = TurnOrder::default();
        order.current_turn = 1;
        order.register_unit(&team(1, 0), UnitId::new(1));
        order.register_unit(&team(2, 1), UnitId::new(2));
        order.register_unit(&team(3, 2), UnitId::new(3));
        order.roster = vec![
            entry(1, 1, UnitState::Done),
            entry(2, 2, UnitState::Downed),
            entry(3, 3, UnitState::Wait),
        ];
        order.progress_turn();
        assert_eq!(order.active_team_index, 2);
    }

    #[test]
    fn next_available_unit_rotates_after_the_active_one() {
        let mut order = TurnOrder::default();
        order.current_turn = 1;
        order.register_unit(&team(1, 0), UnitId::new(1));
        order.register_unit(&team(1, 0), UnitId::new(2));
        order.register_unit(&team(1, 0), UnitId::new(3));
        order.roster = vec![
            entry(1, 1, UnitState::Idle),
            entry(2, 1, UnitState::Done),
            entry(3, 1, UnitState::Idle),
        ];

        order.find_next_available_unit();
        assert_eq!(order.active_unit, Some(UnitId::new(1)));
        order.find_next_available_unit();
        assert_eq!(order.active_unit, Some(UnitId::new(3)));
        order.find_next_available_unit();
        assert_eq!(order.active_unit, Some(UnitId::new(1)));
        assert_eq!(order.display.len(), 3);
    }

    #[test]
    fn machine_waits_for_solidified_units_then_announces() {
        let mut level = Level::new();
        level.turn.register_unit(&team(1, 0), UnitId::new(1));
        level.turn.register_unit(&team(2, 1), UnitId::new(2));

        level.step(vec![entry(1, 1, UnitState::Initialize)], STEP, false);
        assert_eq!(level.state(), Some(LevelState::Initialize));
        level.step(vec![entry(1, 1, UnitState::Idle)], STEP, false);
        assert_eq!(level.state(), Some(LevelState::Solidify));
        level.step(vec![entry(1, 1, UnitState::Solidify)], STEP, false);
        assert_eq!(level.state(), Some(LevelState::Solidify));

        level.step(vec![entry(1, 1, UnitState::Solidify)], STEP, false);
        assert_eq!(level.state(), Some(LevelState::PreTeamAction));
        assert_eq!(
            level.turn.display,
            vec![DisplayCommand::TurnAnnouncement {
                team: TeamId::new(1),
                previous_turn: 1,
                turn: 1
            }]
        );

        for _ in 0..16 {
            level.step(Vec::new(), STEP, false);
        }
        assert_eq!(level.state(), Some(LevelState::PreTeamAction));
        level.step(Vec::new(), STEP, false);
        assert_eq!(level.state(), Some(LevelState::TeamAction));
    }

    #[test]
    fn progress_is_ignored_outside_team_action() {
        let mut level = Level::new();
        level.turn.register_unit(&team(1, 0), UnitId::new(1));
        level.turn.register_unit(&team(2, 1), UnitId::new(2));
        level.turn.roster = vec![entry(1, 1, UnitState::Done), entry(2, 2, UnitState::Wait)];
        level.progress_turn();
        assert_eq!(level.turn.active_team_index, 0);
    }

    fn two_teams() -> TurnOrder {
        let mut order = TurnOrder::default();
        order.current_turn = 1;
        order.register_unit(&team(1, 0), UnitId::new(1));
        order.register_unit(&team(2, 1), UnitId::new(2));
        order
    }

    fn team(id: u32, priority: i32) -> TeamInfo {
        TeamInfo {
            id: TeamId::new(id),
            name: format!("team-{id}"),
            priority,
            color: [255, 255, 255],
            insignia: None,
        }
    }

    fn entry(unit: u32, team: u32, state: UnitState) -> RosterEntry {
        RosterEntry {
            unit: UnitId::new(unit),
            team: TeamId::new(team),
            state,
            transform: Transform {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                height: 20.0,
                tilt: 0.0,
            },
            altitude: 2,
            hitbox_radius: 1.5,
            cruise_distance: 12.5,
        }
    }
}
