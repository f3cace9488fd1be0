//! # Trackball Controls
//!
//! Rotate, zoom and pan a camera around a target point from pointer, wheel
//! and keyboard input. Input handlers only record pointer positions;
//! [`TrackballControls::update`] applies the accumulated motion to the
//! camera and emits [`ControlsEvent::Change`] when the camera moved.
//!
//! Pointer coordinates are logical pixels relative to the surface the
//! controls are bound to.

use crate::camera::PerspectiveCamera;
use crate::renderer::Surface;
use glam::{Quat, Vec2, Vec3};
use plotview_core::{Listener, Shared, SubscriptionId};
use plotview_settings::ControlsSettings;
use tracing::debug;

const EPS: f32 = 0.000001;

/// Wheel delta (in pixels) to zoom-start offset
const WHEEL_ZOOM_SCALE: f32 = 0.00025;

/// Events emitted by [`TrackballControls`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlsEvent {
    /// The camera moved during an update
    Change,
    /// An interaction began (pointer down or wheel)
    Start,
    /// An interaction ended (pointer up or wheel)
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Interaction mode selected by a button or held key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    None,
    Rotate,
    Zoom,
    Pan,
}

/// Screen rectangle in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

pub struct TrackballControls {
    camera: Shared<PerspectiveCamera>,
    surface: Shared<Surface>,

    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub no_rotate: bool,
    pub no_zoom: bool,
    pub no_pan: bool,
    pub static_moving: bool,
    pub dynamic_damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Key codes for rotate, zoom and pan
    pub keys: [u32; 3],
    pub target: Vec3,

    screen: ScreenRect,
    state: ControlMode,
    key_state: ControlMode,

    eye: Vec3,
    last_position: Vec3,
    last_axis: Vec3,
    last_angle: f32,
    move_prev: Vec2,
    move_curr: Vec2,
    zoom_start: Vec2,
    zoom_end: Vec2,
    pan_start: Vec2,
    pan_end: Vec2,

    target0: Vec3,
    position0: Vec3,
    up0: Vec3,

    listeners: Vec<(SubscriptionId, ControlsEvent, Listener<ControlsEvent>)>,
}

impl std::fmt::Debug for TrackballControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackballControls")
            .field("enabled", &self.enabled)
            .field("target", &self.target)
            .field("screen", &self.screen)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl TrackballControls {
    /// Bind controls to `camera`, reading the screen rect from `surface`
    pub fn new(camera: Shared<PerspectiveCamera>, surface: Shared<Surface>) -> Self {
        Self::with_settings(camera, surface, &ControlsSettings::default())
    }

    pub fn with_settings(
        camera: Shared<PerspectiveCamera>,
        surface: Shared<Surface>,
        settings: &ControlsSettings,
    ) -> Self {
        let (position, up) = {
            let camera = camera.borrow();
            (camera.position, camera.up)
        };

        let mut controls = Self {
            camera,
            surface,
            enabled: true,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            pan_speed: settings.pan_speed,
            no_rotate: settings.no_rotate,
            no_zoom: settings.no_zoom,
            no_pan: settings.no_pan,
            static_moving: settings.static_moving,
            dynamic_damping_factor: settings.dynamic_damping_factor,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance.unwrap_or(f32::INFINITY),
            keys: settings.keys,
            target: Vec3::ZERO,
            screen: ScreenRect::default(),
            state: ControlMode::None,
            key_state: ControlMode::None,
            eye: Vec3::ZERO,
            last_position: position,
            last_axis: Vec3::ZERO,
            last_angle: 0.0,
            move_prev: Vec2::ZERO,
            move_curr: Vec2::ZERO,
            zoom_start: Vec2::ZERO,
            zoom_end: Vec2::ZERO,
            pan_start: Vec2::ZERO,
            pan_end: Vec2::ZERO,
            target0: Vec3::ZERO,
            position0: position,
            up0: up,
            listeners: Vec::new(),
        };
        controls.handle_resize();
        controls
    }

    pub fn camera(&self) -> &Shared<PerspectiveCamera> {
        &self.camera
    }

    pub fn screen(&self) -> ScreenRect {
        self.screen
    }

    /// Current interaction mode, a held key taking precedence over a button
    pub fn mode(&self) -> ControlMode {
        if self.key_state != ControlMode::None {
            self.key_state
        } else {
            self.state
        }
    }

    /// Re-read the screen rect from the bound surface
    pub fn handle_resize(&mut self) {
        let surface = self.surface.borrow();
        self.screen = ScreenRect {
            left: 0.0,
            top: 0.0,
            width: surface.width as f32,
            height: surface.height as f32,
        };
        debug!(
            "Trackball screen resized to {}x{}",
            self.screen.width, self.screen.height
        );
    }

    pub fn add_event_listener(
        &mut self,
        event: ControlsEvent,
        listener: Listener<ControlsEvent>,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners.push((id, event, listener));
        debug!("Controls listener {} added for {:?}", id, event);
        id
    }

    /// Returns true if the listener was found and removed
    pub fn remove_event_listener(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        let removed = self.listeners.len() != before;
        if removed {
            debug!("Controls listener {} removed", id);
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn dispatch(&self, event: ControlsEvent) {
        for (_, kind, listener) in &self.listeners {
            if *kind == event {
                listener(&event);
            }
        }
    }

    fn mouse_on_screen(&self, x: f32, y: f32) -> Vec2 {
        if self.screen.width <= 0.0 || self.screen.height <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            (x - self.screen.left) / self.screen.width,
            (y - self.screen.top) / self.screen.height,
        )
    }

    fn mouse_on_circle(&self, x: f32, y: f32) -> Vec2 {
        if self.screen.width <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            (x - self.screen.width * 0.5 - self.screen.left) / (self.screen.width * 0.5),
            (self.screen.height + 2.0 * (self.screen.top - y)) / self.screen.width,
        )
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: f32, y: f32) {
        if !self.enabled {
            return;
        }

        if self.state == ControlMode::None {
            self.state = match button {
                PointerButton::Primary => ControlMode::Rotate,
                PointerButton::Middle => ControlMode::Zoom,
                PointerButton::Secondary => ControlMode::Pan,
            };
        }

        match self.mode() {
            ControlMode::Rotate if !self.no_rotate => {
                self.move_curr = self.mouse_on_circle(x, y);
                self.move_prev = self.move_curr;
            }
            ControlMode::Zoom if !self.no_zoom => {
                self.zoom_start = self.mouse_on_screen(x, y);
                self.zoom_end = self.zoom_start;
            }
            ControlMode::Pan if !self.no_pan => {
                self.pan_start = self.mouse_on_screen(x, y);
                self.pan_end = self.pan_start;
            }
            _ => {}
        }

        self.dispatch(ControlsEvent::Start);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if !self.enabled {
            return;
        }

        match self.mode() {
            ControlMode::Rotate if !self.no_rotate => {
                self.move_prev = self.move_curr;
                self.move_curr = self.mouse_on_circle(x, y);
            }
            ControlMode::Zoom if !self.no_zoom => {
                self.zoom_end = self.mouse_on_screen(x, y);
            }
            ControlMode::Pan if !self.no_pan => {
                self.pan_end = self.mouse_on_screen(x, y);
            }
            _ => {}
        }
    }

    pub fn pointer_up(&mut self) {
        if !self.enabled {
            return;
        }
        self.state = ControlMode::None;
        self.dispatch(ControlsEvent::End);
    }

    /// Zoom by a wheel delta in pixels; positive values zoom out
    pub fn wheel(&mut self, delta_y: f32) {
        if !self.enabled || self.no_zoom {
            return;
        }
        self.zoom_start.y -= delta_y * WHEEL_ZOOM_SCALE;
        self.dispatch(ControlsEvent::Start);
        self.dispatch(ControlsEvent::End);
    }

    pub fn key_down(&mut self, key_code: u32) {
        if !self.enabled || self.key_state != ControlMode::None {
            return;
        }
        let [rotate, zoom, pan] = self.keys;
        if key_code == rotate && !self.no_rotate {
            self.key_state = ControlMode::Rotate;
        } else if key_code == zoom && !self.no_zoom {
            self.key_state = ControlMode::Zoom;
        } else if key_code == pan && !self.no_pan {
            self.key_state = ControlMode::Pan;
        }
    }

    pub fn key_up(&mut self) {
        if !self.enabled {
            return;
        }
        self.key_state = ControlMode::None;
    }

    fn rotate_camera(&mut self, camera: &mut PerspectiveCamera) {
        let delta = self.move_curr - self.move_prev;
        let mut angle = delta.length();

        if angle > 0.0 {
            let eye_direction = self.eye.normalize_or_zero();
            let up_direction = camera.up.normalize_or_zero();
            let sideways_direction = up_direction.cross(eye_direction).normalize_or_zero();
            let move_direction = up_direction * delta.y + sideways_direction * delta.x;
            let axis = move_direction.cross(self.eye).normalize_or_zero();

            if axis != Vec3::ZERO {
                angle *= self.rotate_speed;
                let quaternion = Quat::from_axis_angle(axis, angle);
                self.eye = quaternion * self.eye;
                camera.up = quaternion * camera.up;
                self.last_axis = axis;
                self.last_angle = angle;
            }
        } else if !self.static_moving && self.last_angle != 0.0 {
            self.last_angle *= (1.0 - self.dynamic_damping_factor).sqrt();
            let quaternion = Quat::from_axis_angle(self.last_axis, self.last_angle);
            self.eye = quaternion * self.eye;
            camera.up = quaternion * camera.up;
        }

        self.move_prev = self.move_curr;
    }

    fn zoom_camera(&mut self) {
        let factor = 1.0 + (self.zoom_end.y - self.zoom_start.y) * self.zoom_speed;
        if factor != 1.0 && factor > 0.0 {
            self.eye *= factor;
        }

        if self.static_moving {
            self.zoom_start = self.zoom_end;
        } else {
            self.zoom_start.y +=
                (self.zoom_end.y - self.zoom_start.y) * self.dynamic_damping_factor;
        }
    }

    fn pan_camera(&mut self, camera: &mut PerspectiveCamera) {
        let mouse_change = self.pan_end - self.pan_start;
        if mouse_change.length_squared() == 0.0 {
            return;
        }

        let mouse_change = mouse_change * self.eye.length() * self.pan_speed;
        let pan = self.eye.cross(camera.up).normalize_or_zero() * mouse_change.x
            + camera.up.normalize_or_zero() * mouse_change.y;

        camera.position += pan;
        self.target += pan;

        if self.static_moving {
            self.pan_start = self.pan_end;
        } else {
            self.pan_start += (self.pan_end - self.pan_start) * self.dynamic_damping_factor;
        }
    }

    fn check_distances(&mut self, camera: &mut PerspectiveCamera) {
        if self.no_zoom && self.no_pan {
            return;
        }

        let distance_squared = self.eye.length_squared();
        if distance_squared > self.max_distance * self.max_distance {
            camera.position = self.target + self.eye.normalize_or_zero() * self.max_distance;
            self.zoom_start = self.zoom_end;
        }
        if distance_squared < self.min_distance * self.min_distance {
            camera.position = self.target + self.eye.normalize_or_zero() * self.min_distance;
            self.zoom_start = self.zoom_end;
        }
    }

    /// Apply accumulated input to the camera.
    ///
    /// Emits [`ControlsEvent::Change`] after the camera borrow is released,
    /// so listeners may borrow the camera.
    pub fn update(&mut self) {
        let changed = {
            let camera_handle = self.camera.clone();
            let mut camera = camera_handle.borrow_mut();
            self.eye = camera.position - self.target;

            if !self.no_rotate {
                self.rotate_camera(&mut camera);
            }
            if !self.no_zoom {
                self.zoom_camera();
            }
            if !self.no_pan {
                self.pan_camera(&mut camera);
            }

            camera.position = self.target + self.eye;
            self.check_distances(&mut camera);
            camera.look_at(self.target);

            let moved = self.last_position.distance_squared(camera.position) > EPS;
            if moved {
                self.last_position = camera.position;
            }
            moved
        };

        if changed {
            self.dispatch(ControlsEvent::Change);
        }
    }

    /// Record the current target, camera position and up as the reset state
    pub fn save_state(&mut self) {
        let camera = self.camera.borrow();
        self.target0 = self.target;
        self.position0 = camera.position;
        self.up0 = camera.up;
    }

    /// Restore the state recorded by [`save_state`](Self::save_state)
    pub fn reset(&mut self) {
        self.state = ControlMode::None;
        self.key_state = ControlMode::None;
        self.target = self.target0;
        {
            let mut camera = self.camera.borrow_mut();
            camera.position = self.position0;
            camera.up = self.up0;
            self.eye = camera.position - self.target;
            camera.look_at(self.target);
            self.last_position = camera.position;
        }
        self.dispatch(ControlsEvent::Change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotview_core::shared;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() -> (Shared<PerspectiveCamera>, TrackballControls) {
        let mut camera = PerspectiveCamera::new(60.0, 800.0 / 600.0, 1.0, 1000.0);
        camera.set_position(0.0, 0.0, 50.0);
        let camera = shared(camera);
        let surface = shared(Surface {
            id: 99,
            width: 800,
            height: 600,
            pixel_ratio: 1.0,
        });
        let controls = TrackballControls::new(Rc::clone(&camera), surface);
        (camera, controls)
    }

    fn count_events(controls: &mut TrackballControls, event: ControlsEvent) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        controls.add_event_listener(
            event,
            Box::new(move |_: &ControlsEvent| counter.set(counter.get() + 1)),
        );
        count
    }

    #[test]
    fn test_defaults() {
        let (_, controls) = setup();
        assert_eq!(controls.rotate_speed, 1.0);
        assert_eq!(controls.zoom_speed, 1.2);
        assert_eq!(controls.pan_speed, 0.8);
        assert!(!controls.no_zoom);
        assert!(!controls.no_pan);
        assert!(controls.static_moving);
        assert_eq!(controls.dynamic_damping_factor, 0.3);
        assert_eq!(controls.keys, [65, 83, 68]);
        assert_eq!(controls.screen().width, 800.0);
        assert_eq!(controls.screen().height, 600.0);
    }

    #[test]
    fn test_update_without_input_is_silent() {
        let (camera, mut controls) = setup();
        let changes = count_events(&mut controls, ControlsEvent::Change);
        controls.update();
        assert_eq!(changes.get(), 0);
        assert_eq!(camera.borrow().position, Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn test_rotate_drag_orbits_target() {
        let (camera, mut controls) = setup();
        let changes = count_events(&mut controls, ControlsEvent::Change);

        controls.pointer_down(PointerButton::Primary, 400.0, 300.0);
        controls.pointer_move(500.0, 300.0);
        controls.update();

        let position = camera.borrow().position;
        assert!(position.x < -1.0, "camera should orbit left, got {position}");
        assert!((position.length() - 50.0).abs() < 1e-3);
        assert_eq!(changes.get(), 1);

        // Static moving: no further motion without new input.
        controls.update();
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn test_camera_keeps_facing_target_after_rotate() {
        let (camera, mut controls) = setup();
        controls.pointer_down(PointerButton::Primary, 400.0, 300.0);
        controls.pointer_move(450.0, 250.0);
        controls.update();

        let camera = camera.borrow();
        let to_target = (controls.target - camera.position).normalize();
        assert!(camera.forward().dot(to_target) > 0.9999);
    }

    #[test]
    fn test_wheel_zooms_in() {
        let (camera, mut controls) = setup();
        let starts = count_events(&mut controls, ControlsEvent::Start);
        let ends = count_events(&mut controls, ControlsEvent::End);

        controls.wheel(-400.0);
        controls.update();

        let z = camera.borrow().position.z;
        assert!((z - 44.0).abs() < 1e-3, "expected z = 44, got {z}");
        assert_eq!(starts.get(), 1);
        assert_eq!(ends.get(), 1);
    }

    #[test]
    fn test_pan_moves_target_and_camera() {
        let (camera, mut controls) = setup();
        controls.pointer_down(PointerButton::Secondary, 400.0, 300.0);
        controls.pointer_move(480.0, 300.0);
        controls.update();

        assert!((controls.target - Vec3::new(-4.0, 0.0, 0.0)).length() < 1e-3);
        assert!((camera.borrow().position - Vec3::new(-4.0, 0.0, 50.0)).length() < 1e-3);
    }

    #[test]
    fn test_held_key_overrides_button() {
        let (_, mut controls) = setup();
        controls.key_down(68);
        controls.pointer_down(PointerButton::Primary, 400.0, 300.0);
        assert_eq!(controls.mode(), ControlMode::Pan);

        controls.key_up();
        assert_eq!(controls.mode(), ControlMode::Rotate);
        controls.pointer_up();
        assert_eq!(controls.mode(), ControlMode::None);
    }

    #[test]
    fn test_no_zoom_ignores_wheel() {
        let (camera, mut controls) = setup();
        controls.no_zoom = true;
        controls.wheel(-400.0);
        controls.update();
        assert_eq!(camera.borrow().position, Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn test_max_distance_clamps_zoom_out() {
        let (camera, mut controls) = setup();
        controls.max_distance = 55.0;
        controls.wheel(4000.0);
        controls.update();
        assert!((camera.borrow().position.length() - 55.0).abs() < 1e-3);
    }

    #[test]
    fn test_dynamic_moving_keeps_rotating() {
        let (camera, mut controls) = setup();
        controls.static_moving = false;
        controls.pointer_down(PointerButton::Primary, 400.0, 300.0);
        controls.pointer_move(420.0, 300.0);
        controls.update();
        let after_drag = camera.borrow().position;

        controls.update();
        let after_inertia = camera.borrow().position;
        assert!(after_inertia.x < after_drag.x);
    }

    #[test]
    fn test_remove_event_listener() {
        let (_, mut controls) = setup();
        let id =
            controls.add_event_listener(ControlsEvent::Change, Box::new(|_: &ControlsEvent| {}));
        assert_eq!(controls.listener_count(), 1);
        assert!(controls.remove_event_listener(id));
        assert!(!controls.remove_event_listener(id));
        assert_eq!(controls.listener_count(), 0);
    }

    #[test]
    fn test_reset_restores_saved_state() {
        let (camera, mut controls) = setup();
        controls.save_state();
        controls.pointer_down(PointerButton::Secondary, 400.0, 300.0);
        controls.pointer_move(480.0, 360.0);
        controls.update();
        assert_ne!(controls.target, Vec3::ZERO);

        controls.reset();
        assert_eq!(controls.target, Vec3::ZERO);
        assert_eq!(camera.borrow().position, Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn test_disabled_controls_ignore_input() {
        let (camera, mut controls) = setup();
        controls.enabled = false;
        controls.pointer_down(PointerButton::Primary, 400.0, 300.0);
        controls.pointer_move(600.0, 300.0);
        controls.update();
        assert_eq!(camera.borrow().position, Vec3::new(0.0, 0.0, 50.0));
    }
}
