//! # PlotView Visualizer
//!
//! Scene graph, perspective camera, trackball controls and renderer for the
//! plot viewer, tied together by [`ViewerState`] and the [`init`] and
//! [`animate`] workflows.

pub mod actions;
pub mod camera;
pub mod controls;
pub mod renderer;
pub mod scene;
pub mod store;

pub use actions::{animate, animate_for, frame_interval, init, AnimationHandle};
pub use camera::PerspectiveCamera;
pub use controls::{ControlMode, ControlsEvent, PointerButton, ScreenRect, TrackballControls};
pub use renderer::{
    DrawLine, Frame, HeadlessBackend, HeadlessHost, RenderBackend, Renderer, RendererOptions,
    Surface, SurfaceHost,
};
pub use scene::{
    Color, Fog, Light, Line, LineMaterial, ObjectId, Scene, SceneObject, SceneObjectKind,
    SceneStats,
};
pub use store::ViewerState;
