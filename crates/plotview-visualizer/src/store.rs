//! # Viewer State
//!
//! Owns the viewport size, camera, controls, renderer and scene of one
//! viewer, plus the two toggleable object groups (axis lines and plot
//! lines). Components are created once, in the order renderer, camera,
//! controls, scene; operations that need a component which does not exist
//! yet return [`ViewerError::NotInitialized`].

use crate::camera::PerspectiveCamera;
use crate::controls::{ControlsEvent, PointerButton, TrackballControls};
use crate::renderer::{HeadlessBackend, RenderBackend, Renderer, RendererOptions, SurfaceHost};
use crate::scene::{Color, Fog, Light, Line, LineMaterial, ObjectId, Scene, SceneObjectKind};
use glam::Vec3;
use plotview_core::{shared, PlotPoint, Shared, SubscriptionId, ViewerError, ViewerResult};
use plotview_settings::ViewerConfig;
use std::rc::Rc;
use tracing::{debug, info, warn};

pub struct ViewerState {
    config: ViewerConfig,
    width: u32,
    height: u32,
    camera: Option<Shared<PerspectiveCamera>>,
    controls: Option<TrackballControls>,
    scene: Option<Shared<Scene>>,
    renderer: Option<Shared<Renderer>>,
    axis_lines: Vec<ObjectId>,
    pyramids: Vec<ObjectId>,
    change_subscription: Option<SubscriptionId>,
    backend: Option<Box<dyn RenderBackend>>,
}

impl std::fmt::Debug for ViewerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerState")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("camera", &self.camera)
            .field("controls", &self.controls)
            .field("renderer", &self.renderer)
            .field("axis_lines", &self.axis_lines)
            .field("pyramids", &self.pyramids)
            .finish_non_exhaustive()
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerState {
    pub fn new() -> Self {
        Self::with_config(ViewerConfig::default())
    }

    pub fn with_config(config: ViewerConfig) -> Self {
        Self {
            config,
            width: 0,
            height: 0,
            camera: None,
            controls: None,
            scene: None,
            renderer: None,
            axis_lines: Vec::new(),
            pyramids: Vec::new(),
            change_subscription: None,
            backend: None,
        }
    }

    /// Use `backend` for the renderer created by [`initialize_renderer`](Self::initialize_renderer).
    ///
    /// Without one the renderer gets a [`HeadlessBackend`].
    pub fn with_backend(mut self, backend: Box<dyn RenderBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn camera(&self) -> Option<&Shared<PerspectiveCamera>> {
        self.camera.as_ref()
    }

    pub fn controls(&self) -> Option<&TrackballControls> {
        self.controls.as_ref()
    }

    pub fn controls_mut(&mut self) -> Option<&mut TrackballControls> {
        self.controls.as_mut()
    }

    pub fn scene(&self) -> Option<&Shared<Scene>> {
        self.scene.as_ref()
    }

    pub fn renderer(&self) -> Option<&Shared<Renderer>> {
        self.renderer.as_ref()
    }

    pub fn axis_lines(&self) -> &[ObjectId] {
        &self.axis_lines
    }

    pub fn pyramids(&self) -> &[ObjectId] {
        &self.pyramids
    }

    pub fn is_subscribed_to_changes(&self) -> bool {
        self.change_subscription.is_some()
    }

    /// Current camera position, if the camera exists
    pub fn camera_position(&self) -> Option<Vec3> {
        self.camera.as_ref().map(|camera| camera.borrow().position)
    }

    pub fn axis_lines_visible(&self) -> bool {
        self.group_visible(&self.axis_lines)
    }

    pub fn pyramids_visible(&self) -> bool {
        self.group_visible(&self.pyramids)
    }

    fn group_visible(&self, group: &[ObjectId]) -> bool {
        match &self.scene {
            Some(scene) => {
                let scene = scene.borrow();
                !group.is_empty() && group.iter().all(|id| scene.is_attached(*id))
            }
            None => false,
        }
    }

    fn require_camera(&self) -> ViewerResult<&Shared<PerspectiveCamera>> {
        self.camera
            .as_ref()
            .ok_or_else(|| ViewerError::not_initialized("camera"))
    }

    fn require_scene(&self) -> ViewerResult<&Shared<Scene>> {
        self.scene
            .as_ref()
            .ok_or_else(|| ViewerError::not_initialized("scene"))
    }

    fn require_renderer(&self) -> ViewerResult<&Shared<Renderer>> {
        self.renderer
            .as_ref()
            .ok_or_else(|| ViewerError::not_initialized("renderer"))
    }

    fn require_controls(&mut self) -> ViewerResult<&mut TrackballControls> {
        self.controls
            .as_mut()
            .ok_or_else(|| ViewerError::not_initialized("controls"))
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        debug!("Viewport size set to {}x{}", width, height);
        self.width = width;
        self.height = height;
    }

    /// Create the renderer and append its surface to `target`
    pub fn initialize_renderer(&mut self, target: &mut dyn SurfaceHost) {
        let settings = &self.config.renderer;
        let backend = self
            .backend
            .take()
            .unwrap_or_else(|| Box::new(HeadlessBackend::new()));
        let mut renderer = Renderer::new(
            RendererOptions {
                antialias: settings.antialias,
            },
            backend,
        );
        renderer.set_pixel_ratio(settings.pixel_ratio.unwrap_or(target.device_pixel_ratio()));
        renderer.set_size(self.width, self.height);
        target.append_child(renderer.surface());

        debug!(
            "Renderer initialized at {}x{} (pixel ratio {})",
            self.width,
            self.height,
            renderer.pixel_ratio()
        );
        self.renderer = Some(shared(renderer));
    }

    pub fn initialize_camera(&mut self) -> ViewerResult<()> {
        if self.height == 0 {
            return Err(ViewerError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }

        let settings = &self.config.camera;
        let mut camera = PerspectiveCamera::new(
            settings.fov,
            self.width as f32 / self.height as f32,
            settings.near,
            settings.far,
        );
        let [x, y, z] = settings.position;
        camera.set_position(x, y, z);

        debug!("Camera initialized at {}", camera.position);
        self.camera = Some(shared(camera));
        Ok(())
    }

    pub fn initialize_controls(&mut self) -> ViewerResult<()> {
        let camera = Rc::clone(self.require_camera()?);
        let surface = self.require_renderer()?.borrow().surface();

        let controls = TrackballControls::with_settings(camera, surface, &self.config.controls);
        debug!("Trackball controls initialized");
        self.controls = Some(controls);
        Ok(())
    }

    /// Advance the controls by one step
    pub fn update_controls(&mut self) -> ViewerResult<()> {
        self.require_controls()?.update();
        Ok(())
    }

    /// Build the scene: background and fog, the plot line, lights and axis lines
    pub fn initialize_scene(&mut self, plot_points: &[PlotPoint]) {
        let settings = &self.config.scene;
        let mut scene = Scene::new();
        scene.background = Some(Color::from_hex(settings.background));
        scene.fog = Some(Fog::exp2(
            Color::from_hex(settings.fog_color),
            settings.fog_density,
        ));

        let vertices = plot_points
            .iter()
            .map(|point| Vec3::new(point.px, point.py, point.pz))
            .collect();
        let plot_line = scene.add(
            "plot",
            SceneObjectKind::Line(Line::new(
                vertices,
                LineMaterial::Basic {
                    color: Color::from_hex(settings.plot_line_color),
                    linewidth: settings.line_width,
                },
            )),
        );
        self.pyramids.push(plot_line);

        scene.add(
            "key light",
            SceneObjectKind::Light(Light::Directional {
                color: Color::from_hex(settings.key_light_color),
                position: Vec3::from_array(settings.key_light_position),
            }),
        );
        scene.add(
            "fill light",
            SceneObjectKind::Light(Light::Directional {
                color: Color::from_hex(settings.fill_light_color),
                position: Vec3::from_array(settings.fill_light_position),
            }),
        );
        scene.add(
            "ambient light",
            SceneObjectKind::Light(Light::Ambient {
                color: Color::from_hex(settings.ambient_light_color),
            }),
        );

        let length = settings.axis_length;
        let axes = [
            ("y axis", 0x0000ff, Vec3::new(0.0, length, 0.0)),
            ("x axis", 0x00ff00, Vec3::new(length, 0.0, 0.0)),
            ("z axis", 0xff0000, Vec3::new(0.0, 0.0, length)),
        ];
        for (name, color, end) in axes {
            let id = scene.insert(
                name,
                SceneObjectKind::Line(Line::new(
                    vec![Vec3::ZERO, end],
                    LineMaterial::Dashed {
                        color: Color::from_hex(color),
                        linewidth: settings.line_width,
                        dash_size: settings.dash_size,
                        gap_size: settings.gap_size,
                    },
                )),
            );
            self.axis_lines.push(id);
        }
        scene.attach(&self.axis_lines);

        info!(
            "Scene initialized with {} plot points and {} axis lines",
            plot_points.len(),
            self.axis_lines.len()
        );
        self.scene = Some(shared(scene));
    }

    /// Render the scene once through the camera
    pub fn render(&self) -> ViewerResult<()> {
        let scene = self.require_scene()?;
        let camera = self.require_camera()?;
        let renderer = self.require_renderer()?;
        renderer.borrow_mut().render(&scene.borrow(), &camera.borrow())
    }

    /// Resize the viewport, keeping camera, renderer and controls consistent
    pub fn resize(&mut self, width: u32, height: u32) -> ViewerResult<()> {
        if height == 0 {
            return Err(ViewerError::InvalidViewport { width, height });
        }
        let camera = Rc::clone(self.require_camera()?);
        let renderer = Rc::clone(self.require_renderer()?);
        self.require_controls()?;

        self.width = width;
        self.height = height;
        {
            let mut camera = camera.borrow_mut();
            camera.aspect = width as f32 / height as f32;
            camera.update_projection_matrix();
        }
        renderer.borrow_mut().set_size(width, height);
        self.require_controls()?.handle_resize();

        debug!("Viewer resized to {}x{}", width, height);
        self.render()
    }

    /// Move the camera. Does nothing before the camera exists.
    pub fn set_camera_position(&mut self, x: f32, y: f32, z: f32) {
        match &self.camera {
            Some(camera) => camera.borrow_mut().set_position(x, y, z),
            None => warn!("Ignoring camera position before camera initialization"),
        }
    }

    /// Reset camera orientation and aim the controls at the origin.
    /// Does nothing before the camera exists.
    pub fn reset_camera_rotation(&mut self) {
        let Some(camera) = &self.camera else {
            warn!("Ignoring camera rotation reset before camera initialization");
            return;
        };
        camera.borrow_mut().reset_orientation();
        if let Some(controls) = &mut self.controls {
            controls.target = Vec3::ZERO;
        }
    }

    pub fn hide_axis_lines(&mut self) -> ViewerResult<()> {
        self.require_scene()?.borrow_mut().detach(&self.axis_lines);
        self.render()
    }

    pub fn show_axis_lines(&mut self) -> ViewerResult<()> {
        self.require_scene()?.borrow_mut().attach(&self.axis_lines);
        self.render()
    }

    pub fn hide_pyramids(&mut self) -> ViewerResult<()> {
        self.require_scene()?.borrow_mut().detach(&self.pyramids);
        self.render()
    }

    pub fn show_pyramids(&mut self) -> ViewerResult<()> {
        self.require_scene()?.borrow_mut().attach(&self.pyramids);
        self.render()
    }

    /// Re-render whenever the controls report a camera change.
    ///
    /// Replaces any earlier subscription made through this method.
    pub fn subscribe_render_on_change(&mut self) -> ViewerResult<SubscriptionId> {
        let scene = Rc::clone(self.require_scene()?);
        let camera = Rc::clone(self.require_camera()?);
        let renderer = Rc::clone(self.require_renderer()?);
        let previous = self.change_subscription.take();

        let controls = self.require_controls()?;
        if let Some(previous) = previous {
            controls.remove_event_listener(previous);
        }
        let id = controls.add_event_listener(
            ControlsEvent::Change,
            Box::new(move |_: &ControlsEvent| {
                let result = renderer
                    .borrow_mut()
                    .render(&scene.borrow(), &camera.borrow());
                if let Err(e) = result {
                    warn!("Re-render after controls change failed: {}", e);
                }
            }),
        );

        self.change_subscription = Some(id);
        Ok(id)
    }

    /// Remove the re-render subscription; returns true if one was active
    pub fn unsubscribe_render_on_change(&mut self) -> bool {
        let Some(id) = self.change_subscription.take() else {
            return false;
        };
        self.controls
            .as_mut()
            .is_some_and(|controls| controls.remove_event_listener(id))
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: f32, y: f32) -> ViewerResult<()> {
        self.require_controls()?.pointer_down(button, x, y);
        Ok(())
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> ViewerResult<()> {
        self.require_controls()?.pointer_move(x, y);
        Ok(())
    }

    pub fn pointer_up(&mut self) -> ViewerResult<()> {
        self.require_controls()?.pointer_up();
        Ok(())
    }

    pub fn wheel(&mut self, delta_y: f32) -> ViewerResult<()> {
        self.require_controls()?.wheel(delta_y);
        Ok(())
    }

    pub fn key_down(&mut self, key_code: u32) -> ViewerResult<()> {
        self.require_controls()?.key_down(key_code);
        Ok(())
    }

    pub fn key_up(&mut self) -> ViewerResult<()> {
        self.require_controls()?.key_up();
        Ok(())
    }
}
