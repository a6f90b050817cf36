//! Headless driver that lets the autopilot play a loaded skirmish.

use std::time::Duration;

use aerial_tactics_core::{Command, DisplayCommand, Event, Frame, MoveInput, UnitState};
use aerial_tactics_system_autopilot::{Autopilot, Contact, Situation, Waypoint};
use aerial_tactics_world::{self as world, query, ActionSnapshot, World};
use tracing::{debug, warn};

/// Limits for a headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunLimits {
    /// Simulated time per tick.
    pub(crate) dt: Duration,
    /// Maximum number of ticks to simulate.
    pub(crate) ticks: u64,
    /// Turn at which the run stops.
    pub(crate) turns: u32,
}

/// Outcome of a headless run.
#[derive(Debug, Default)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) turn: u32,
    pub(crate) attacks: usize,
    pub(crate) hits: usize,
    pub(crate) downed: usize,
    pub(crate) effects: usize,
}

/// Plays the skirmish until the turn limit, a decided level or the tick budget.
pub(crate) fn run(world: &mut World, mut events: Vec<Event>, limits: RunLimits) -> Summary {
    let mut autopilot = Autopilot::new();
    let mut commands = Vec::new();
    let mut display: Vec<DisplayCommand> = Vec::new();
    let mut summary = Summary::default();

    while summary.ticks < limits.ticks {
        if query::current_turn(world) >= limits.turns || is_decided(world) {
            break;
        }

        let contacts = contacts(world);
        let situation = Situation {
            level_state: query::level_state(world),
            turn: query::current_turn(world),
            team_index: query::active_team_index(world),
            active_team: query::active_team(world).map(|team| team.id),
            active_unit: query::active_unit(world),
            settings: *query::settings(world),
            contacts: &contacts,
        };
        let input = autopilot.handle(&situation, &mut commands);
        for command in commands.drain(..) {
            debug!(?command, "autopilot command");
            world::apply(world, command, &mut events, &mut display);
        }
        world::apply(
            world,
            Command::Tick {
                dt: limits.dt,
                input,
            },
            &mut events,
            &mut display,
        );
        summary.ticks += 1;

        tally(&mut summary, events.drain(..));
        summary.effects += display
            .drain(..)
            .filter(|command| matches!(command, DisplayCommand::PlayEffect { .. }))
            .count();
    }

    if summary.ticks >= limits.ticks {
        warn!(ticks = summary.ticks, "tick budget exhausted before the skirmish ended");
    }
    summary.turn = query::current_turn(world);
    summary
}

fn tally(summary: &mut Summary, events: impl Iterator<Item = Event>) {
    for event in events {
        match event {
            Event::AttackResolved { hits, .. } => {
                summary.attacks += 1;
                summary.hits += hits.iter().filter(|hit| **hit > 0.0).count();
            }
            Event::UnitDowned { .. } => summary.downed += 1,
            _ => {}
        }
    }
}

/// Whether at most one team still has flying units.
fn is_decided(world: &World) -> bool {
    let flying = query::teams(world)
        .iter()
        .filter(|team| {
            query::team_units(world, team.id).iter().any(|unit| {
                query::unit_state(world, *unit).map_or(true, |state| state != UnitState::Downed)
            })
        })
        .count();
    flying < 2
}

fn contacts(world: &World) -> Vec<Contact> {
    query::unit_views(world)
        .into_iter()
        .map(|view| Contact {
            unit: view.id,
            team: view.team,
            state: view.state,
            stats: view.stats,
            pre: waypoint(&view.pre),
            post: waypoint(&view.post),
            position: view.transform.position,
            height: view.transform.height,
        })
        .collect()
}

fn waypoint(snapshot: &ActionSnapshot) -> Waypoint {
    Waypoint {
        frame: Frame::new(snapshot.position, snapshot.rotation),
        input: MoveInput::new(snapshot.speed, snapshot.steer),
        altitude: snapshot.altitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario;

    fn limits(turns: u32) -> RunLimits {
        RunLimits {
            dt: Duration::from_millis(100),
            ticks: 20_000,
            turns,
        }
    }

    #[test]
    fn bundled_skirmish_reaches_the_turn_limit() {
        let scenario = scenario::load(None).expect("bundled scenario loads");
        let mut events = Vec::new();
        let mut world = World::from_scenario(&scenario, &mut events).expect("valid level");

        let summary = run(&mut world, events, limits(3));
        assert_eq!(summary.turn, 3);
        assert!(summary.ticks > 0 && summary.ticks < 20_000);
        assert!(summary.hits <= summary.attacks * 12);
    }

    #[test]
    fn tick_budget_caps_the_run() {
        let scenario = scenario::load(None).expect("bundled scenario loads");
        let mut world = World::from_scenario(&scenario, &mut Vec::new()).expect("valid level");

        let summary = run(
            &mut world,
            Vec::new(),
            RunLimits {
                ticks: 5,
                ..limits(3)
            },
        );
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.turn, 1);
    }

    #[test]
    fn a_single_flying_team_decides_the_level() {
        let mut scenario = scenario::load(None).expect("bundled scenario loads");
        scenario.placements.retain(|placement| placement.team.get() == 1);
        let mut world = World::from_scenario(&scenario, &mut Vec::new()).expect("valid level");

        assert!(is_decided(&world));
        assert_eq!(run(&mut world, Vec::new(), limits(3)).ticks, 0);
    }
}
