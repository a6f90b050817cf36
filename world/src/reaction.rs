//! Unit behaviour while another team acts: waiting, previewing, taking hits
//! and falling.

use std::time::Duration;

use aerial_tactics_core::{
    DisplayCommand, DropPath, Effect, Event, FlightPath, Indicator, InputQuery, LevelState, Path,
    RangeFloat2, UnitId, UnitState,
};
use glam::{Quat, Vec3};
use tracing::{debug, info};

use crate::{maneuver::Grace, unit::UnitActor};

/// Time taken to reveal incoming hits.
const DAMAGE_DURATION: Duration = Duration::from_secs(1);
/// Downward acceleration of a falling unit.
const GRAVITY: f32 = -19.6;
/// Height a falling unit drops during the first phase.
const FALL_HEIGHT: f32 = 60.0;
/// Drop, then two phases resting at the crash site.
const FALL_PHASES: usize = 3;

/// Slack used while previewing a move out of turn.
const PREDICTION_GRACE: Grace = Grace {
    distances: RangeFloat2::new(-2.0, 2.0),
    near_angles: RangeFloat2::new(-15.0, 15.0),
    far_angles: RangeFloat2::new(-15.0, 15.0),
};

/// Hits queued by an attacker.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ReceivedDamage {
    source: UnitId,
    hits: Vec<f32>,
}

/// Working state of the damage reveal.
#[derive(Clone, Debug, Default)]
pub(crate) struct DamageReveal {
    pub(crate) received: Option<ReceivedDamage>,
    displayed_health: f32,
    revealed: usize,
    elapsed: Duration,
}

impl DamageReveal {
    pub(crate) fn receive(&mut self, source: UnitId, hits: Vec<f32>) {
        self.received = Some(ReceivedDamage { source, hits });
    }

    fn hit_count(&self) -> usize {
        self.received.as_ref().map_or(0, |damage| damage.hits.len())
    }

    fn hit(&self, index: usize) -> f32 {
        self.received
            .as_ref()
            .and_then(|damage| damage.hits.get(index))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Working state of the fall animation.
#[derive(Clone, Debug)]
pub(crate) struct Fall {
    phase_duration: f32,
    elapsed: Duration,
    phase: usize,
    curves: [Path; FALL_PHASES],
    exploded: bool,
}

impl Default for Fall {
    fn default() -> Self {
        Self {
            phase_duration: 1.0,
            elapsed: Duration::ZERO,
            phase: 0,
            curves: [Path::Blank; FALL_PHASES],
            exploded: false,
        }
    }
}

impl UnitActor {
    pub(crate) fn wait_entry(&mut self) {
        self.rest_at_pre();
        self.hovered = false;
        self.indicate(Indicator::Mini, false);
    }

    pub(crate) fn wait_body(&mut self) {
        self.update_hover();
        if self.env.active_unit.is_none() && self.env.input.is_selected(self.id) {
            self.set_active_unit(Some(self.id));
        }
    }

    pub(crate) fn wait_transition(&mut self) -> Option<UnitState> {
        if self.env.level_state == Some(LevelState::Solidify) {
            Some(UnitState::Solidify)
        } else if self.is_active() {
            Some(UnitState::AttackPrediction)
        } else if self.damage.received.is_some() {
            Some(UnitState::DamageAnimation)
        } else {
            None
        }
    }

    pub(crate) fn attack_prediction_entry(&mut self) {
        self.hovered = false;
        self.movement.planned = None;
        self.show_envelope();
        self.indicate(Indicator::Normal, false);
    }

    pub(crate) fn attack_prediction_body(&mut self) {
        let planned = self.aim(self.pre.altitude, PREDICTION_GRACE);
        self.preview_path(planned);
        if self.env.input.is_pressed_on_scene() {
            self.set_active_unit(None);
        }
    }

    pub(crate) fn attack_prediction_transition(&mut self) -> Option<UnitState> {
        (!self.is_active()).then_some(UnitState::Wait)
    }

    pub(crate) fn attack_prediction_exit(&mut self) {
        self.movement.planned = None;
        self.hide_layers();
    }

    pub(crate) fn damage_animation_entry(&mut self) {
        self.damage.elapsed = Duration::ZERO;
        self.damage.revealed = 0;
        self.damage.displayed_health = self.pre.health;
        if let Some(damage) = &self.damage.received {
            debug!(
                unit = self.id.get(),
                source = damage.source.get(),
                hits = damage.hits.len(),
                "revealing damage"
            );
        }
        self.indicate(Indicator::Normal, false);
    }

    /// Reveals hit `k` once `k / (hits + 2)` of the animation elapsed.
    pub(crate) fn damage_animation_body(&mut self) {
        self.damage.elapsed = self.damage.elapsed.saturating_add(self.env.dt);
        let count = self.damage.hit_count();
        let step = DAMAGE_DURATION.as_secs_f32() / (count + 2) as f32;
        let elapsed = self.damage.elapsed.as_secs_f32();

        while self.damage.revealed <= count + 1 && elapsed >= self.damage.revealed as f32 * step {
            let index = self.damage.revealed;
            self.damage.revealed += 1;
            if index == 0 || index > count {
                continue;
            }
            let hit = self.damage.hit(index - 1);
            if hit > 0.0 {
                self.damage.displayed_health -= hit;
                self.display(DisplayCommand::Health {
                    unit: self.id,
                    health: self.damage.displayed_health.max(0.0),
                });
                self.display(DisplayCommand::PlayEffect {
                    unit: self.id,
                    effect: Effect::Hit,
                });
            }
        }
    }

    pub(crate) fn damage_animation_transition(&mut self) -> Option<UnitState> {
        if self.damage.displayed_health <= 0.0 {
            Some(UnitState::DownAnimation)
        } else if self.damage.elapsed >= DAMAGE_DURATION {
            Some(UnitState::Wait)
        } else {
            None
        }
    }

    pub(crate) fn damage_animation_exit(&mut self) {
        let total: f32 = self
            .damage
            .received
            .take()
            .map_or(0.0, |damage| damage.hits.iter().sum());
        let health = self.pre.health - total;
        self.pre.health = health;
        self.post.health = health;
        info!(unit = self.id.get(), damage = total, health, "damage applied");
        self.display(DisplayCommand::Health {
            unit: self.id,
            health: health.max(0.0),
        });
        if health > 0.0 && health < self.stats.max_health * 0.5 {
            self.display(DisplayCommand::PlayEffect {
                unit: self.id,
                effect: Effect::Smoke,
            });
        }
        self.report(Event::DamageApplied {
            unit: self.id,
            damage: total,
            health,
        });
    }

    pub(crate) fn down_animation_entry(&mut self) {
        let phase_duration = (2.0 * FALL_HEIGHT / -GRAVITY).sqrt();
        let curves = [
            Path::Drop(DropPath::new(self.pre.path, GRAVITY, phase_duration)),
            Path::Blank,
            Path::Blank,
        ];
        self.fall = Fall {
            phase_duration,
            elapsed: Duration::ZERO,
            phase: 0,
            curves,
            exploded: false,
        };
        for curve in curves {
            self.trail.push(curve, self.pre.tilt);
        }
        self.post.position = self.pre.position;
        self.post.rotation = self.pre.rotation;
        self.rest_at_pre();
        self.display(DisplayCommand::PlayEffect {
            unit: self.id,
            effect: Effect::Smoke,
        });
        self.indicate(Indicator::Hidden, true);
    }

    /// Advances along the current fall curve, re-basing at every phase change.
    pub(crate) fn down_animation_body(&mut self) {
        self.fall.elapsed = self.fall.elapsed.saturating_add(self.env.dt);
        let elapsed = self.fall.elapsed.as_secs_f32();
        let duration = self.fall.phase_duration;

        if self.fall.phase + 1 < FALL_PHASES
            && elapsed > duration * (self.fall.phase + 1) as f32
        {
            self.fall.phase += 1;
            self.post.position = self.transform.position;
            self.post.rotation = self.transform.rotation;
        }

        let curve = self.fall.curves[self.fall.phase];
        let progress = (elapsed % duration) / duration;
        self.transform.position =
            self.post.position + self.post.rotation * curve.point_at(progress);
        self.transform.rotation =
            Quat::from_rotation_arc(Vec3::Z, curve.direction_projection_at(progress))
                * self.post.rotation;

        if !self.fall.exploded && self.transform.world_point().y <= 0.0 {
            self.fall.exploded = true;
            self.display(DisplayCommand::PlayEffect {
                unit: self.id,
                effect: Effect::Explosion,
            });
        }
    }

    pub(crate) fn down_animation_transition(&mut self) -> Option<UnitState> {
        let total = self.fall.phase_duration * FALL_PHASES as f32;
        (self.fall.elapsed.as_secs_f32() > total).then_some(UnitState::Downed)
    }

    pub(crate) fn down_animation_exit(&mut self) {
        info!(unit = self.id.get(), "unit downed");
        self.report(Event::UnitDowned { unit: self.id });
    }

    pub(crate) fn downed_entry(&mut self) {
        self.hide_layers();
        self.indicate(Indicator::Hidden, true);
    }
}
