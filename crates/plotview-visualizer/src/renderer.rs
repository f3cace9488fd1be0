//! # Renderer
//!
//! The renderer owns an output [`Surface`], turns a scene seen through a
//! camera into a [`Frame`] and hands that frame to a [`RenderBackend`].
//! The surface is attached to a [`SurfaceHost`], the element that displays
//! it.

use crate::camera::PerspectiveCamera;
use crate::scene::{Color, Fog, LineMaterial, ObjectId, Scene, SceneObjectKind};
use glam::{Mat4, Vec3};
use plotview_core::{shared, Shared, ViewerResult};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

static NEXT_SURFACE_ID: AtomicU32 = AtomicU32::new(1);

/// Drawable output area of a renderer
///
/// `width` and `height` are logical pixels; the drawing buffer is scaled by
/// `pixel_ratio`.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Surface {
    fn new() -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            width: 0,
            height: 0,
            pixel_ratio: 1.0,
        }
    }

    /// Drawing buffer size in device pixels
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).floor() as u32,
            (self.height as f32 * self.pixel_ratio).floor() as u32,
        )
    }
}

/// Element that displays renderer surfaces
pub trait SurfaceHost {
    /// Ratio of device pixels to logical pixels on this host
    fn device_pixel_ratio(&self) -> f32;

    /// Attach a surface as a child of this host
    fn append_child(&mut self, surface: Shared<Surface>);
}

/// In-memory host used when no windowing system is present
#[derive(Debug)]
pub struct HeadlessHost {
    pixel_ratio: f32,
    children: Vec<Shared<Surface>>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl HeadlessHost {
    pub fn new(pixel_ratio: f32) -> Self {
        Self {
            pixel_ratio,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[Shared<Surface>] {
        &self.children
    }
}

impl SurfaceHost for HeadlessHost {
    fn device_pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn append_child(&mut self, surface: Shared<Surface>) {
        self.children.push(surface);
    }
}

/// Line ready for rasterization
#[derive(Debug, Clone, PartialEq)]
pub struct DrawLine {
    pub object: ObjectId,
    /// Vertices in normalized device coordinates
    pub vertices: Vec<Vec3>,
    pub color: Color,
    pub linewidth: f32,
    /// `(dash_size, gap_size)` for dashed lines
    pub dash: Option<(f32, f32)>,
    /// Cumulative world-space distance at each vertex, filled for dashed lines
    pub line_distances: Vec<f32>,
    /// Fog blend at the line's centroid
    pub fog_factor: f32,
}

/// Everything a backend needs to present one image
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    /// Viewport in device pixels
    pub viewport: (u32, u32),
    pub antialias: bool,
    pub clear_color: Option<Color>,
    pub fog: Option<Fog>,
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub lines: Vec<DrawLine>,
    pub lights: usize,
}

impl Frame {
    pub fn vertex_count(&self) -> usize {
        self.lines.iter().map(|line| line.vertices.len()).sum()
    }
}

/// Presents frames produced by a [`Renderer`]
pub trait RenderBackend {
    fn present(&mut self, frame: &Frame) -> ViewerResult<()>;
}

/// Backend that accepts every frame without drawing it
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    presented: u64,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl RenderBackend for HeadlessBackend {
    fn present(&mut self, frame: &Frame) -> ViewerResult<()> {
        self.presented += 1;
        trace!(
            "Presented frame {} ({} lines, {} vertices)",
            frame.index,
            frame.lines.len(),
            frame.vertex_count()
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererOptions {
    pub antialias: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self { antialias: true }
    }
}

pub struct Renderer {
    options: RendererOptions,
    surface: Shared<Surface>,
    backend: Box<dyn RenderBackend>,
    frames_rendered: u64,
    last_frame: Option<Frame>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .field("surface", &self.surface)
            .field("frames_rendered", &self.frames_rendered)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new(options: RendererOptions, backend: Box<dyn RenderBackend>) -> Self {
        Self {
            options,
            surface: shared(Surface::new()),
            backend,
            frames_rendered: 0,
            last_frame: None,
        }
    }

    pub fn headless(options: RendererOptions) -> Self {
        Self::new(options, Box::new(HeadlessBackend::new()))
    }

    pub fn options(&self) -> RendererOptions {
        self.options
    }

    /// Shared handle to the output surface
    pub fn surface(&self) -> Shared<Surface> {
        Rc::clone(&self.surface)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.surface.borrow().pixel_ratio
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.surface.borrow_mut().pixel_ratio = ratio;
    }

    pub fn size(&self) -> (u32, u32) {
        let surface = self.surface.borrow();
        (surface.width, surface.height)
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        let mut surface = self.surface.borrow_mut();
        surface.width = width;
        surface.height = height;
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Render the attached objects of `scene` as seen from `camera`
    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> ViewerResult<()> {
        let frame = self.build_frame(scene, camera);
        self.backend.present(&frame)?;
        self.frames_rendered += 1;
        self.last_frame = Some(frame);
        Ok(())
    }

    fn build_frame(&self, scene: &Scene, camera: &PerspectiveCamera) -> Frame {
        let view_projection = camera.view_projection_matrix();
        let mut lines = Vec::new();
        let mut lights = 0;

        for object in scene.visible_objects() {
            match &object.kind {
                SceneObjectKind::Line(line) => {
                    let fog_factor = scene
                        .fog
                        .map(|fog| fog.factor(camera.position.distance(line.centroid())))
                        .unwrap_or(0.0);
                    let (dash, line_distances) = match line.material {
                        LineMaterial::Dashed {
                            dash_size,
                            gap_size,
                            ..
                        } => (Some((dash_size, gap_size)), line.line_distances()),
                        LineMaterial::Basic { .. } => (None, Vec::new()),
                    };
                    lines.push(DrawLine {
                        object: object.id,
                        vertices: line
                            .vertices
                            .iter()
                            .map(|v| view_projection.project_point3(*v))
                            .collect(),
                        color: line.material.color(),
                        linewidth: line.material.linewidth(),
                        dash,
                        line_distances,
                        fog_factor,
                    });
                }
                SceneObjectKind::Light(_) => lights += 1,
            }
        }

        Frame {
            index: self.frames_rendered,
            viewport: self.surface.borrow().drawing_buffer_size(),
            antialias: self.options.antialias,
            clear_color: scene.background,
            fog: scene.fog,
            view_projection,
            camera_position: camera.position,
            lines,
            lights,
        }
    }
}
