//! Pointer and selection queries the controllers are driven by.

use glam::{Quat, Vec2, Vec3};

use crate::{envelope::MoveResult, UnitId};

/// Position and orientation of a unit on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Origin of the frame in world space.
    pub position: Vec3,
    /// Orientation of the frame; +Z is forward.
    pub rotation: Quat,
}

impl Frame {
    /// Frame at the world origin facing +Z.
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quat::IDENTITY);

    /// Creates a frame from its components.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Converts a world-space point into frame-local coordinates.
    #[must_use]
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    /// Converts a frame-local point into world space.
    #[must_use]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

/// Half-line cast from the camera through the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start of the ray in world space.
    pub origin: Vec3,
    /// Direction of travel; need not be normalised.
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Intersects the ray with the plane through `point` with normal `normal`.
    #[must_use]
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denominator = self.direction.dot(normal);
        if denominator.abs() < f32::EPSILON {
            return None;
        }
        let distance = (point - self.origin).dot(normal) / denominator;
        (distance >= 0.0).then(|| self.origin + self.direction * distance)
    }
}

/// Queries the controllers issue against the player's pointer.
pub trait InputQuery {
    /// Unit clicked this frame, if any.
    fn any_selected(&self) -> Option<UnitId>;

    /// Unit under the pointer, if any.
    fn any_hovering(&self) -> Option<UnitId>;

    /// Whether a confirm click landed on the scene this frame.
    fn is_pressed_on_scene(&self) -> bool;

    /// Projects the pointer onto the horizontal plane `height` above `frame`.
    ///
    /// Returns the planar distance from the frame origin and the signed bearing
    /// in degrees, positive towards the frame's +X.
    fn polar_plane_cast(&self, frame: Frame, height: f32) -> Option<MoveResult>;

    /// Pointer movement accumulated while `button` was held.
    fn drag_delta(&self, button: usize) -> Vec2;

    /// Whether the player asked to hand the turn on.
    fn advance_requested(&self) -> bool;

    /// Whether `unit` was clicked this frame.
    fn is_selected(&self, unit: UnitId) -> bool {
        self.any_selected() == Some(unit)
    }

    /// Whether `unit` is under the pointer.
    fn is_hovering(&self, unit: UnitId) -> bool {
        self.any_hovering() == Some(unit)
    }
}

/// Snapshot of player input gathered by an adapter for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Unit under the pointer.
    pub hovered: Option<UnitId>,
    /// Unit clicked this frame.
    pub selected: Option<UnitId>,
    /// Confirm click released this frame.
    pub pressed: bool,
    /// Pointer currently rests on interface chrome.
    pub over_ui: bool,
    /// Ray through the pointer, when the pointer is inside the viewport.
    pub pointer: Option<Ray>,
    /// Drag deltas for the primary, secondary and middle buttons.
    pub drag_deltas: [Vec2; 3],
    /// Request to move on to the next unit or team.
    pub advance: bool,
}

impl InputQuery for FrameInput {
    fn any_selected(&self) -> Option<UnitId> {
        if self.over_ui {
            None
        } else {
            self.selected
        }
    }

    fn any_hovering(&self) -> Option<UnitId> {
        if self.over_ui {
            None
        } else {
            self.hovered
        }
    }

    fn is_pressed_on_scene(&self) -> bool {
        self.pressed && !self.over_ui
    }

    fn polar_plane_cast(&self, frame: Frame, height: f32) -> Option<MoveResult> {
        if self.over_ui {
            return None;
        }
        let ray = self.pointer?;
        let up = frame.rotation * Vec3::Y;
        let hit = ray.intersect_plane(frame.position + up * height, up)?;
        let local = frame.to_local(hit) - Vec3::Y * height;
        Some(MoveResult::new(
            local.length(),
            local.x.atan2(local.z).to_degrees(),
        ))
    }

    fn drag_delta(&self, button: usize) -> Vec2 {
        self.drag_deltas.get(button).copied().unwrap_or(Vec2::ZERO)
    }

    fn advance_requested(&self) -> bool {
        self.advance && !self.over_ui
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_cast_measures_from_the_frame() {
        let frame = Frame::new(
            Vec3::new(5.0, 0.0, 5.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let input = FrameInput {
            pointer: Some(Ray::new(Vec3::new(15.0, 50.0, 5.0), Vec3::NEG_Y)),
            ..FrameInput::default()
        };

        let cast = input.polar_plane_cast(frame, 20.0).expect("cast hits plane");
        assert!((cast.distance - 10.0).abs() < 1e-3);
        assert!(cast.azimuth.abs() < 1e-2);
    }

    #[test]
    fn polar_cast_reports_signed_bearing() {
        let input = FrameInput {
            pointer: Some(Ray::new(Vec3::new(-10.0, 30.0, 10.0), Vec3::NEG_Y)),
            ..FrameInput::default()
        };
        let cast = input
            .polar_plane_cast(Frame::IDENTITY, 0.0)
            .expect("cast hits plane");
        assert!((cast.azimuth + 45.0).abs() < 1e-3);
    }

    #[test]
    fn interface_chrome_swallows_queries() {
        let input = FrameInput {
            hovered: Some(UnitId::new(3)),
            selected: Some(UnitId::new(3)),
            pressed: true,
            over_ui: true,
            pointer: Some(Ray::new(Vec3::Y, Vec3::NEG_Y)),
            ..FrameInput::default()
        };
        assert_eq!(input.any_hovering(), None);
        assert!(!input.is_selected(UnitId::new(3)));
        assert!(!input.is_pressed_on_scene());
        assert_eq!(input.polar_plane_cast(Frame::IDENTITY, 0.0), None);
    }

    #[test]
    fn ray_parallel_to_plane_misses() {
        let ray = Ray::new(Vec3::Y, Vec3::X);
        assert_eq!(ray.intersect_plane(Vec3::ZERO, Vec3::Y), None);
        let behind = Ray::new(Vec3::Y, Vec3::Y);
        assert_eq!(behind.intersect_plane(Vec3::ZERO, Vec3::Y), None);
    }
}
