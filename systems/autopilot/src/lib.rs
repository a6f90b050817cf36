#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that plays the active team from world snapshots.
//!
//! Every call looks at the level as the player would see it and answers with
//! the pointer input for the next tick plus any menu commands. The autopilot
//! only ever drives units of the acting team and leaves waiting units alone,
//! so it can stand in for either side of a hot-seat skirmish.

use aerial_tactics_core::{
    Command, FlightPath, Frame, FrameInput, LevelSettings, LevelState, MoveInput, MoveResult,
    Ray, TeamId, TurnPath, UnitId, UnitState, UnitStats,
};
use aerial_tactics_system_combat::{self as combat, AttackProfile, Attacker, Candidate};
use glam::{Quat, Vec3};

/// Samples per envelope axis when searching for a move.
const ENVELOPE_SAMPLES: u16 = 8;
/// Height the aiming ray is cast from.
const AIM_HEIGHT: f32 = 1000.0;

/// Flight state of a unit at a turn boundary, as seen from outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// Ground frame of the snapshot.
    pub frame: Frame,
    /// Envelope input that produced the snapshot.
    pub input: MoveInput,
    /// Altitude level.
    pub altitude: i32,
}

/// Everything the autopilot observes about a single unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    /// Identifier of the unit.
    pub unit: UnitId,
    /// Team the unit fights for.
    pub team: TeamId,
    /// Current action state, once started.
    pub state: Option<UnitState>,
    /// Static stats of the unit.
    pub stats: UnitStats,
    /// Snapshot committed at the start of the turn.
    pub pre: Waypoint,
    /// Snapshot the unit is heading for.
    pub post: Waypoint,
    /// Ground position the unit is presented at.
    pub position: Vec3,
    /// Height the unit is presented at.
    pub height: f32,
}

impl Contact {
    fn world_point(&self) -> Vec3 {
        self.position + Vec3::Y * self.height
    }

    fn is_down(&self) -> bool {
        self.state.map_or(false, UnitState::is_down)
    }
}

/// Level-wide facts the autopilot needs alongside the contacts.
#[derive(Clone, Copy, Debug)]
pub struct Situation<'a> {
    /// Turn state of the level, once started.
    pub level_state: Option<LevelState>,
    /// Global turn number.
    pub turn: u32,
    /// Index of the acting team in priority order.
    pub team_index: usize,
    /// Team currently acting.
    pub active_team: Option<TeamId>,
    /// Unit currently selected.
    pub active_unit: Option<UnitId>,
    /// Altitude configuration of the level.
    pub settings: LevelSettings,
    /// Every registered unit in registration order.
    pub contacts: &'a [Contact],
}

impl Situation<'_> {
    fn contact(&self, unit: UnitId) -> Option<&Contact> {
        self.contacts.iter().find(|contact| contact.unit == unit)
    }

    fn is_settled(&self, team: TeamId) -> bool {
        self.contacts.iter().all(|contact| {
            contact.state.map_or(false, |state| {
                if contact.team == team {
                    state.has_finished_turn()
                } else {
                    state.is_standing_by()
                }
            })
        })
    }
}

/// Autopilot that reuses its scratch buffer between calls.
#[derive(Debug, Default)]
pub struct Autopilot {
    plans: Vec<Plan>,
    handover: Option<(u32, usize)>,
}

impl Autopilot {
    /// Creates an autopilot with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides the input for the next tick.
    ///
    /// The command buffer is cleared before populating it with menu commands
    /// that should be applied ahead of the tick.
    pub fn handle(&mut self, situation: &Situation<'_>, out: &mut Vec<Command>) -> FrameInput {
        out.clear();

        if situation.level_state != Some(LevelState::TeamAction) {
            self.handover = None;
            return FrameInput::default();
        }
        let Some(team) = situation.active_team else {
            return FrameInput::default();
        };

        match situation.active_unit.and_then(|unit| situation.contact(unit)) {
            Some(pilot) if pilot.team == team => match pilot.state {
                Some(UnitState::MoveMenu) => self.aim_move(pilot, situation),
                Some(UnitState::AttackMenu) => engage(pilot, situation, out),
                _ => FrameInput::default(),
            },
            Some(_) => FrameInput::default(),
            None => self.pick_unit(team, situation, out),
        }
    }

    fn pick_unit(
        &mut self,
        team: TeamId,
        situation: &Situation<'_>,
        out: &mut Vec<Command>,
    ) -> FrameInput {
        let idle = situation
            .contacts
            .iter()
            .find(|contact| contact.team == team && contact.state == Some(UnitState::Idle));
        if let Some(contact) = idle {
            return FrameInput {
                selected: Some(contact.unit),
                ..FrameInput::default()
            };
        }

        let acting = (situation.turn, situation.team_index);
        let waiting_for_handover = self.handover.map_or(false, |issued| issued != acting);
        if !waiting_for_handover && situation.is_settled(team) {
            self.handover = Some(acting);
            out.push(Command::ProgressTurn);
        }
        FrameInput::default()
    }

    fn aim_move(&mut self, pilot: &Contact, situation: &Situation<'_>) -> FrameInput {
        self.plan_moves(pilot, situation);
        let best = self
            .plans
            .iter()
            .filter(|plan| !plan.blocked)
            .fold(None::<&Plan>, |best, plan| match best {
                Some(existing) if !plan.precedes(existing) => Some(existing),
                _ => Some(plan),
            });

        let Some(plan) = best else {
            return FrameInput::default();
        };
        FrameInput {
            pointer: Some(Ray::new(
                plan.destination + Vec3::Y * AIM_HEIGHT,
                Vec3::NEG_Y,
            )),
            pressed: true,
            ..FrameInput::default()
        }
    }

    fn plan_moves(&mut self, pilot: &Contact, situation: &Situation<'_>) {
        self.plans.clear();
        let stats = &pilot.stats;
        let available = stats.move_area.sub_area(pilot.pre.input, stats.move_adjust);
        let frame = pilot.pre.frame;
        let height = situation.settings.height_of(pilot.pre.altitude);
        let samples = f32::from(ENVELOPE_SAMPLES);

        for speed in 0..=ENVELOPE_SAMPLES {
            for steer in 0..=ENVELOPE_SAMPLES {
                let input =
                    MoveInput::new(f32::from(speed) / samples, f32::from(steer) / samples);
                let result = available.evaluate(input);
                let path = TurnPath::from_result(result, 0.0);
                let destination = frame.to_world(path.point_projection_at(1.0));
                let heading = Quat::from_rotation_arc(Vec3::Z, path.direction_projection_at(1.0))
                    * frame.rotation;

                let airborne = destination + Vec3::Y * height;
                let blocked = situation.contacts.iter().any(|contact| {
                    contact.world_point().distance(airborne)
                        <= contact.stats.hitbox_radius + stats.hitbox_radius
                });

                let attacker = Attacker {
                    team: pilot.team,
                    altitude: pilot.pre.altitude,
                    position: destination,
                    forward: heading * Vec3::Z,
                    profile: AttackProfile::from(stats),
                };
                let enemies = situation
                    .contacts
                    .iter()
                    .filter(|contact| contact.team != pilot.team && !contact.is_down());
                let mut probability = 0.0_f32;
                let mut closing = f32::INFINITY;
                for enemy in enemies {
                    closing = closing.min(enemy.position.distance(destination));
                    let prospect = combat::evaluate(
                        &attacker,
                        &Candidate {
                            unit: enemy.unit,
                            team: enemy.team,
                            altitude: enemy.pre.altitude,
                            position: enemy.position,
                            hitbox_radius: enemy.stats.hitbox_radius,
                            state: UnitState::Wait,
                        },
                    );
                    if let Some(engagement) = prospect {
                        probability = probability.max(engagement.probability);
                    }
                }

                self.plans.push(Plan {
                    result,
                    destination,
                    blocked,
                    probability,
                    closing,
                });
            }
        }
    }
}

/// Attacks the most likely hit in reach, or gives up the attack.
fn engage(pilot: &Contact, situation: &Situation<'_>, out: &mut Vec<Command>) -> FrameInput {
    let attacker = Attacker {
        team: pilot.team,
        altitude: pilot.post.altitude,
        position: pilot.post.frame.position,
        forward: pilot.post.frame.rotation * Vec3::Z,
        profile: AttackProfile::from(&pilot.stats),
    };
    let best = situation
        .contacts
        .iter()
        .filter_map(|contact| {
            let state = contact.state?;
            combat::evaluate(
                &attacker,
                &Candidate {
                    unit: contact.unit,
                    team: contact.team,
                    altitude: contact.pre.altitude,
                    position: contact.position,
                    hitbox_radius: contact.stats.hitbox_radius,
                    state,
                },
            )
        })
        .fold(None::<combat::Engagement>, |best, engagement| match best {
            Some(existing) if existing.probability >= engagement.probability => Some(existing),
            _ => Some(engagement),
        });

    match best {
        Some(engagement) => FrameInput {
            hovered: Some(engagement.target),
            pressed: true,
            ..FrameInput::default()
        },
        None => {
            out.push(Command::SkipAttack { unit: pilot.unit });
            FrameInput::default()
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Plan {
    result: MoveResult,
    destination: Vec3,
    blocked: bool,
    probability: f32,
    closing: f32,
}

impl Plan {
    fn precedes(&self, other: &Plan) -> bool {
        if self.probability != other.probability {
            return self.probability > other.probability;
        }
        if self.closing != other.closing {
            return self.closing < other.closing;
        }
        self.result.distance < other.result.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_the_first_idle_unit_of_the_active_team() {
        let contacts = vec![
            contact(1, 1, UnitState::Done, Vec3::ZERO),
            contact(2, 2, UnitState::Wait, Vec3::new(0.0, 0.0, 40.0)),
            contact(3, 1, UnitState::Idle, Vec3::new(10.0, 0.0, 0.0)),
        ];
        let mut autopilot = Autopilot::new();
        let mut commands = Vec::new();
        let input = autopilot.handle(&situation(&contacts, None), &mut commands);
        assert_eq!(input.selected, Some(UnitId::new(3)));
        assert!(commands.is_empty());
    }

    #[test]
    fn hands_over_once_per_team_turn() {
        let contacts = vec![contact(1, 1, UnitState::Done, Vec3::ZERO)];
        let mut autopilot = Autopilot::new();
        let mut commands = Vec::new();

        let _ = autopilot.handle(&situation(&contacts, None), &mut commands);
        assert_eq!(commands, vec![Command::ProgressTurn]);

        let mut wrapped = situation(&contacts, None);
        wrapped.turn = 2;
        let _ = autopilot.handle(&wrapped, &mut commands);
        assert!(commands.is_empty());

        let _ = autopilot.handle(&situation(&contacts, None), &mut commands);
        assert_eq!(commands, vec![Command::ProgressTurn]);
    }

    #[test]
    fn stays_quiet_outside_team_action() {
        let contacts = vec![contact(1, 1, UnitState::Idle, Vec3::ZERO)];
        let mut quiet = situation(&contacts, None);
        quiet.level_state = Some(LevelState::PreTeamAction);
        let mut commands = Vec::new();
        let input = Autopilot::new().handle(&quiet, &mut commands);
        assert_eq!(input, FrameInput::default());
        assert!(commands.is_empty());
    }

    #[test]
    fn prefers_moves_that_line_up_a_shot() {
        let contacts = vec![
            contact(1, 1, UnitState::MoveMenu, Vec3::ZERO),
            contact(2, 2, UnitState::Wait, Vec3::new(0.0, 0.0, 40.0)),
        ];
        let mut autopilot = Autopilot::new();
        let mut commands = Vec::new();
        let input = autopilot.handle(&situation(&contacts, Some(1)), &mut commands);

        let ray = input.pointer.expect("aims a move");
        assert!(input.pressed);
        assert!(ray.origin.x.abs() < 1e-3);
        assert!(ray.origin.z > 15.0);
    }

    #[test]
    fn skips_the_attack_without_a_target() {
        let contacts = vec![
            contact(1, 1, UnitState::AttackMenu, Vec3::ZERO),
            contact(2, 2, UnitState::Wait, Vec3::new(40.0, 0.0, 0.0)),
        ];
        let mut commands = Vec::new();
        let input = Autopilot::new().handle(&situation(&contacts, Some(1)), &mut commands);
        assert_eq!(input, FrameInput::default());
        assert_eq!(
            commands,
            vec![Command::SkipAttack {
                unit: UnitId::new(1)
            }]
        );
    }

    #[test]
    fn presses_on_the_best_target() {
        let contacts = vec![
            contact(1, 1, UnitState::AttackMenu, Vec3::ZERO),
            contact(2, 2, UnitState::Wait, Vec3::new(0.0, 0.0, 25.0)),
            contact(3, 2, UnitState::Wait, Vec3::new(0.0, 0.0, 12.0)),
        ];
        let mut commands = Vec::new();
        let input = Autopilot::new().handle(&situation(&contacts, Some(1)), &mut commands);
        assert_eq!(input.hovered, Some(UnitId::new(3)));
        assert!(input.pressed);
        assert!(commands.is_empty());
    }

    fn situation(contacts: &[Contact], active: Option<u32>) -> Situation<'_> {
        Situation {
            level_state: Some(LevelState::TeamAction),
            turn: 1,
            team_index: 0,
            active_team: Some(TeamId::new(1)),
            active_unit: active.map(UnitId::new),
            settings: LevelSettings::default(),
            contacts,
        }
    }

    fn contact(unit: u32, team: u32, state: UnitState, position: Vec3) -> Contact {
        let rotation = if team == 1 {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_y(std::f32::consts::PI)
        };
        let waypoint = Waypoint {
            frame: Frame::new(position, rotation),
            input: MoveInput::new(0.5, 0.5),
            altitude: 2,
        };
        Contact {
            unit: UnitId::new(unit),
            team: TeamId::new(team),
            state: Some(state),
            stats: UnitStats::default(),
            pre: waypoint,
            post: waypoint,
            position,
            height: 20.0,
        }
    }
}
