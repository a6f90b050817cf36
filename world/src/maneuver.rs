//! Move selection and attack selection while a unit's team acts.

use std::time::Duration;

use aerial_tactics_core::{
    range::{lerp, smooth_step},
    DisplayCommand, Effect, Event, FlightPath, Indicator, InputQuery, Layer, Marker, MoveResult,
    Path, RangeFloat2, TurnPath, UnitId, UnitState,
};
use aerial_tactics_system_combat::{self as combat, AttackProfile, Attacker, Candidate, Engagement};
use glam::{Quat, Vec3};
use tracing::info;

use crate::{
    roster::units_in_point,
    unit::{ActionSnapshot, Transform, UnitActor},
};

/// Time taken to fly a committed move.
const MOVE_DURATION: Duration = Duration::from_millis(750);
/// Time taken by the attack effect.
const ATTACK_DURATION: Duration = Duration::from_secs(1);
/// Bank angle at the outermost near azimuth.
const MOVE_TILT: f32 = 60.0;

/// Slack around the reachable envelope within which aiming still snaps to it.
pub(crate) const MOVE_GRACE: Grace = Grace {
    distances: RangeFloat2::new(-5.0, 5.0),
    near_angles: RangeFloat2::new(-15.0, 15.0),
    far_angles: RangeFloat2::new(-15.0, 15.0),
};

/// Envelope slack added to a reachable area.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Grace {
    pub(crate) distances: RangeFloat2,
    pub(crate) near_angles: RangeFloat2,
    pub(crate) far_angles: RangeFloat2,
}

/// Working state of move selection and the move animation.
#[derive(Clone, Debug, Default)]
pub(crate) struct MoveSelection {
    pub(crate) selected_altitude: i32,
    pub(crate) planned: Option<TurnPath>,
    pub(crate) candidate: Option<TurnPath>,
    pub(crate) decided: Option<TurnPath>,
    obstructions: Vec<UnitId>,
    elapsed: Duration,
}

/// Working state of target selection and the attack animation.
#[derive(Clone, Debug, Default)]
pub(crate) struct AttackSelection {
    previewed: Option<UnitId>,
    pub(crate) decided: Option<UnitId>,
    elapsed: Duration,
}

impl UnitActor {
    /// Path towards the pointer at `altitude`, snapped into the reachable envelope.
    pub(crate) fn aim(&self, altitude: i32, grace: Grace) -> Option<TurnPath> {
        let height = self.height_of(altitude);
        let hit = self.env.input.polar_plane_cast(self.pre.frame(), height)?;
        let available = self
            .stats
            .move_area
            .sub_area(self.pre.input(), self.stats.move_adjust);
        let snapping = available.expand(grace.distances, grace.near_angles, grace.far_angles);
        if !snapping.is_include(hit) {
            return None;
        }
        let climb = height - self.height_of(self.pre.altitude);
        Some(TurnPath::from_result(available.clamp(hit), climb))
    }

    /// Draws `path` as the candidate move, skipping unchanged previews.
    pub(crate) fn preview_path(&mut self, path: Option<TurnPath>) {
        if path == self.movement.planned {
            return;
        }
        self.movement.planned = path;
        if let Some(path) = path {
            self.display(DisplayCommand::PathPreview {
                unit: self.id,
                path,
                height: self.height_of(self.pre.altitude),
            });
        }
        self.show(Layer::MovePath, path.is_some());
    }

    pub(crate) fn change_selected_altitude(&mut self, delta: i32) {
        let altitude = self
            .env
            .settings
            .clamp_altitude(self.movement.selected_altitude.saturating_add(delta));
        self.movement.selected_altitude = altitude;
        self.display(DisplayCommand::Altitude {
            unit: self.id,
            altitude,
        });
    }

    pub(crate) fn undo_move(&mut self) {
        self.movement.decided = None;
        self.post = self.pre;
        self.trail.drop_newest();
        self.publish_trails(1.0);
    }

    pub(crate) fn skip_attack(&mut self) {
        self.set_active_unit(None);
    }

    fn destination_blockers(&self, path: &TurnPath) -> Vec<UnitId> {
        let start = self.pre.position + Vec3::Y * self.height_of(self.pre.altitude);
        let destination = start + self.pre.rotation * path.point_at(1.0);
        units_in_point(&self.env.roster, destination, self.stats.hitbox_radius)
            .into_iter()
            .filter(|unit| *unit != self.id)
            .collect()
    }

    fn mark_obstructions(&mut self, blockers: Vec<UnitId>) {
        let previous = std::mem::take(&mut self.movement.obstructions);
        for unit in previous.iter().filter(|unit| !blockers.contains(unit)) {
            self.display(DisplayCommand::RevertMarker { unit: *unit });
        }
        for unit in blockers.iter().filter(|unit| !previous.contains(unit)) {
            self.display(DisplayCommand::Marker {
                unit: *unit,
                marker: Marker::Collision,
            });
        }
        self.movement.obstructions = blockers;
    }

    fn commit_move(&mut self, path: TurnPath) {
        let rotation = self.pre.rotation;
        let area = self.stats.move_area;
        let input = area.inverse(MoveResult::new(path.distance(), path.azimuth()));
        self.post = ActionSnapshot {
            position: self.pre.position + rotation * path.point_projection_at(1.0),
            rotation: Quat::from_rotation_arc(Vec3::Z, path.direction_projection_at(1.0))
                * rotation,
            altitude: self.movement.selected_altitude,
            speed: input.speed,
            steer: input.steer,
            path,
            tilt: lerp(
                MOVE_TILT,
                -MOVE_TILT,
                area.near_angles.inverse_lerp(path.azimuth()),
            ),
            health: self.pre.health,
        };
        self.movement.decided = Some(path);
        self.trail.push(Path::Turn(path), self.post.tilt);
        info!(
            unit = self.id.get(),
            distance = path.distance(),
            azimuth = path.azimuth(),
            altitude = self.post.altitude,
            "move committed"
        );
        self.report(Event::MoveCommitted {
            unit: self.id,
            path,
        });
    }

    fn attacker(&self) -> Attacker {
        Attacker {
            team: self.team,
            altitude: self.post.altitude,
            position: self.post.position,
            forward: self.post.rotation * Vec3::Z,
            profile: AttackProfile::from(&self.stats),
        }
    }

    fn engagement_with(&self, unit: UnitId) -> Option<Engagement> {
        let entry = self.env.roster.iter().find(|entry| entry.unit == unit)?;
        combat::evaluate(
            &self.attacker(),
            &Candidate {
                unit: entry.unit,
                team: entry.team,
                altitude: entry.altitude,
                position: entry.transform.position,
                hitbox_radius: entry.hitbox_radius,
                state: entry.state,
            },
        )
    }

    fn clear_target_preview(&mut self) {
        if let Some(previous) = self.attack.previewed.take() {
            self.display(DisplayCommand::RevertMarker { unit: previous });
            self.display(DisplayCommand::TargetPreview {
                unit: self.id,
                target: None,
                probability: 0.0,
            });
            self.set_target_unit(None);
        }
    }

    pub(crate) fn move_menu_entry(&mut self) {
        self.rest_at_pre();
        self.movement = MoveSelection {
            selected_altitude: self.pre.altitude,
            ..MoveSelection::default()
        };
        self.show_envelope();
        self.indicate(Indicator::Normal, false);
        self.display(DisplayCommand::Altitude {
            unit: self.id,
            altitude: self.pre.altitude,
        });
    }

    pub(crate) fn move_menu_body(&mut self) {
        let planned = self.aim(self.movement.selected_altitude, MOVE_GRACE);
        let blockers = planned
            .map(|path| self.destination_blockers(&path))
            .unwrap_or_default();
        self.mark_obstructions(blockers);
        self.preview_path(planned);

        let candidate = planned.filter(|_| self.movement.obstructions.is_empty());
        if candidate != self.movement.candidate {
            self.show(Layer::ProjectedModel, candidate.is_some());
            self.movement.candidate = candidate;
        }

        if self.env.input.is_pressed_on_scene() {
            match candidate {
                Some(path) => self.commit_move(path),
                None => self.set_active_unit(None),
            }
        }
    }

    pub(crate) fn move_menu_transition(&mut self) -> Option<UnitState> {
        if self.movement.decided.is_some() {
            Some(UnitState::MoveAnimation)
        } else if !self.is_active() {
            Some(UnitState::Idle)
        } else {
            None
        }
    }

    pub(crate) fn move_menu_exit(&mut self) {
        self.mark_obstructions(Vec::new());
        self.movement.planned = None;
        self.movement.candidate = None;
        self.hide_layers();
    }

    pub(crate) fn move_animation_entry(&mut self) {
        self.movement.elapsed = Duration::ZERO;
    }

    pub(crate) fn move_animation_body(&mut self) {
        self.movement.elapsed = self.movement.elapsed.saturating_add(self.env.dt);
        let Some(path) = self.movement.decided else {
            return;
        };
        let progress =
            (self.movement.elapsed.as_secs_f32() / MOVE_DURATION.as_secs_f32()).min(1.0);
        let rotation = self.pre.rotation;
        self.transform = Transform {
            position: self.pre.position + rotation * path.point_projection_at(progress),
            rotation: Quat::from_rotation_arc(Vec3::Z, path.direction_projection_at(progress))
                * rotation,
            height: smooth_step(
                self.height_of(self.pre.altitude),
                self.height_of(self.post.altitude),
                progress,
            ),
            tilt: smooth_step(self.pre.tilt, self.post.tilt, progress),
        };
        self.publish_trails(progress);
    }

    pub(crate) fn move_animation_transition(&mut self) -> Option<UnitState> {
        (self.movement.elapsed >= MOVE_DURATION).then_some(UnitState::AttackMenu)
    }

    pub(crate) fn move_animation_exit(&mut self) {
        self.transform = Transform::at_rest(&self.post, &self.env.settings);
    }

    pub(crate) fn attack_menu_entry(&mut self) {
        self.attack = AttackSelection::default();
        self.display(DisplayCommand::AttackArea {
            unit: self.id,
            distances: self.stats.attack_distances,
            max_angle: self.stats.attack_max_angle,
            height: self.height_of(self.post.altitude),
        });
        self.show(Layer::AttackArea, true);
        self.indicate(Indicator::Normal, false);
    }

    pub(crate) fn attack_menu_body(&mut self) {
        let engagement = self
            .env
            .input
            .any_hovering()
            .and_then(|unit| self.engagement_with(unit));
        let target = engagement.map(|engagement| engagement.target);

        if target != self.attack.previewed {
            self.clear_target_preview();
            if let Some(engagement) = engagement {
                self.display(DisplayCommand::Marker {
                    unit: engagement.target,
                    marker: Marker::Target,
                });
                self.display(DisplayCommand::TargetPreview {
                    unit: self.id,
                    target: Some(engagement.target),
                    probability: engagement.probability,
                });
                self.set_target_unit(Some(engagement.target));
                self.attack.previewed = Some(engagement.target);
            }
        }

        if !self.env.input.is_pressed_on_scene() {
            return;
        }
        if let Some(engagement) = engagement {
            info!(
                unit = self.id.get(),
                target = engagement.target.get(),
                probability = engagement.probability,
                "attack confirmed"
            );
            self.attack.decided = Some(engagement.target);
            self.request_attack(engagement.target, engagement.probability);
            self.trail.drop_oldest();
            self.publish_trails(1.0);
        }
    }

    pub(crate) fn attack_menu_transition(&mut self) -> Option<UnitState> {
        if self.movement.decided.is_none() {
            Some(UnitState::MoveMenu)
        } else if self.attack.decided.is_some() {
            Some(UnitState::AttackAnimation)
        } else if !self.is_active() {
            Some(UnitState::Done)
        } else {
            None
        }
    }

    pub(crate) fn attack_menu_exit(&mut self) {
        self.clear_target_preview();
        self.show(Layer::AttackArea, false);
        // Leaving with a committed move but no attack still ends the turn.
        if self.movement.decided.is_some() && self.attack.decided.is_none() {
            self.trail.drop_oldest();
            self.publish_trails(1.0);
        }
    }

    pub(crate) fn attack_animation_entry(&mut self) {
        self.attack.elapsed = Duration::ZERO;
        self.display(DisplayCommand::PlayEffect {
            unit: self.id,
            effect: Effect::Attack,
        });
    }

    pub(crate) fn attack_animation_body(&mut self) {
        self.attack.elapsed = self.attack.elapsed.saturating_add(self.env.dt);
    }

    pub(crate) fn attack_animation_transition(&mut self) -> Option<UnitState> {
        (self.attack.elapsed >= ATTACK_DURATION).then_some(UnitState::Done)
    }

    pub(crate) fn attack_animation_exit(&mut self) {
        self.set_active_unit(None);
        self.set_target_unit(None);
    }
}
