//! Presentation requests issued by the controllers.
//!
//! The simulation owns no rendering logic. It describes what should be shown
//! and an adapter-provided [`DisplaySink`] turns that into meshes, markers and
//! overlays.

use glam::Vec3;

use crate::{
    envelope::MoveArea, input::Frame, path::Path, path::TurnPath, range::RangeFloat4, TeamId,
    UnitId,
};

/// Named visual layers owned by a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Full envelope around the committed position.
    CurrentMoveFull,
    /// Reachable part of the envelope around the committed position.
    CurrentMoveArea,
    /// Full envelope around the tentative destination.
    NextMoveFull,
    /// Reachable part of the envelope around the tentative destination.
    NextMoveArea,
    /// Candidate path preview.
    MovePath,
    /// Weapon reach around the unit.
    AttackArea,
    /// Ghost model placed at the tentative destination.
    ProjectedModel,
}

/// Ground marker styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Default marker beneath the unit.
    Normal,
    /// Marker beneath the projected destination.
    Projection,
    /// Marker highlighting a unit that can be attacked.
    Target,
    /// Marker highlighting a unit blocking a destination.
    Collision,
}

/// Screen-space indicator styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indicator {
    /// No indicator.
    Hidden,
    /// Compact indicator shown while idle.
    Mini,
    /// Full indicator shown while hovered or acting.
    Normal,
}

/// One-shot or looping visual effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Weapon fire.
    Attack,
    /// Hit landing on the unit.
    Hit,
    /// Damage smoke trail.
    Smoke,
    /// Impact explosion.
    Explosion,
}

/// Requests consumed by the display collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayCommand {
    /// Shows or hides a layer.
    SetVisible {
        /// Owner of the layer.
        unit: UnitId,
        /// Layer affected.
        layer: Layer,
        /// Whether the layer should be drawn.
        visible: bool,
    },
    /// Rebuilds an envelope mesh.
    MoveArea {
        /// Owner of the layer.
        unit: UnitId,
        /// Layer to rebuild.
        layer: Layer,
        /// Envelope to draw.
        area: MoveArea,
        /// Frame the envelope is anchored to, relative to the unit.
        anchor: Frame,
        /// Height of the mesh above the ground.
        height: f32,
    },
    /// Rebuilds the weapon reach mesh.
    AttackArea {
        /// Owner of the layer.
        unit: UnitId,
        /// Distance bands of the weapon.
        distances: RangeFloat4,
        /// Half-angle of the weapon cone in degrees.
        max_angle: f32,
        /// Height of the mesh above the ground.
        height: f32,
    },
    /// Rebuilds the candidate path preview.
    PathPreview {
        /// Owner of the layer.
        unit: UnitId,
        /// Path to draw.
        path: TurnPath,
        /// Height of the path start above the ground.
        height: f32,
    },
    /// Rebuilds the trail of previous turns.
    Trails {
        /// Owner of the trail.
        unit: UnitId,
        /// Segments from oldest to newest.
        paths: Vec<Path>,
        /// Bank angle at each segment boundary.
        tilts: Vec<f32>,
        /// Progress along the newest segment.
        progress: f32,
    },
    /// Replaces the unit's ground marker.
    Marker {
        /// Unit carrying the marker.
        unit: UnitId,
        /// Marker style.
        marker: Marker,
    },
    /// Restores the unit's own ground marker after an override.
    RevertMarker {
        /// Unit carrying the marker.
        unit: UnitId,
    },
    /// Replaces the unit's screen-space indicator.
    Indicator {
        /// Unit carrying the indicator.
        unit: UnitId,
        /// Indicator style.
        indicator: Indicator,
        /// Whether the unit finished its turn.
        done: bool,
    },
    /// Updates the displayed health.
    Health {
        /// Unit whose health changed.
        unit: UnitId,
        /// Health to display.
        health: f32,
    },
    /// Updates the displayed altitude level.
    Altitude {
        /// Unit whose altitude changed.
        unit: UnitId,
        /// Altitude level to display.
        altitude: i32,
    },
    /// Shows the expected outcome of an attack.
    TargetPreview {
        /// Attacking unit.
        unit: UnitId,
        /// Candidate target, or `None` to clear the preview.
        target: Option<UnitId>,
        /// Per-roll hit probability.
        probability: f32,
    },
    /// Starts a visual effect on a unit.
    PlayEffect {
        /// Unit emitting the effect.
        unit: UnitId,
        /// Effect to start.
        effect: Effect,
    },
    /// Announces the team about to act.
    TurnAnnouncement {
        /// Team taking over.
        team: TeamId,
        /// Turn number shown before the change.
        previous_turn: u32,
        /// Turn number shown after the change.
        turn: u32,
    },
    /// Moves the camera to look at a point.
    FocusCamera {
        /// World-space point to centre on.
        point: Vec3,
    },
}

/// Receiver for [`DisplayCommand`] values.
pub trait DisplaySink {
    /// Accepts a single presentation request.
    fn submit(&mut self, command: DisplayCommand);
}

impl DisplaySink for Vec<DisplayCommand> {
    fn submit(&mut self, command: DisplayCommand) {
        self.push(command);
    }
}
