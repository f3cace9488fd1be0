//! # Viewer Workflows
//!
//! `init` builds a ready-to-render viewer in one call. `animate` drives the
//! controls once per frame on the current thread's `LocalSet` until its
//! handle is stopped or dropped.

use crate::renderer::SurfaceHost;
use crate::store::ViewerState;
use plotview_core::{PlotPoint, Shared, ViewerError, ViewerResult};
use plotview_settings::RendererSettings;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Initialize renderer, camera, controls and scene, render once, and
/// re-render on every controls change.
///
/// Every step runs synchronously; the future is ready on first poll.
pub async fn init(
    state: &mut ViewerState,
    width: u32,
    height: u32,
    target: &mut dyn SurfaceHost,
    plot_points: &[PlotPoint],
) -> ViewerResult<()> {
    state.set_viewport_size(width, height);
    state.initialize_renderer(target);
    state.initialize_camera()?;
    state.initialize_controls()?;
    state.initialize_scene(plot_points);

    state.render()?;
    state.subscribe_render_on_change()?;

    info!("Viewer initialized at {}x{}", width, height);
    Ok(())
}

/// Frame interval for the configured frame rate
pub fn frame_interval(settings: &RendererSettings) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(settings.frame_rate.max(1)))
}

/// Handle to a running animation loop
///
/// Dropping the handle stops the loop at its next frame.
#[derive(Debug)]
pub struct AnimationHandle {
    stop: watch::Sender<bool>,
    frames: Rc<Cell<u64>>,
    task: JoinHandle<ViewerResult<()>>,
}

impl AnimationHandle {
    /// Ask the loop to stop before its next frame
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Frames advanced so far
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop, wait for it to exit and return the frames it ran
    pub async fn join(self) -> ViewerResult<u64> {
        self.stop();
        self.wait().await
    }

    /// Wait for the loop to end on its own (frame limit or error) without
    /// asking it to stop, and return the frames it ran
    pub async fn wait(self) -> ViewerResult<u64> {
        let Self { stop, frames, task } = self;
        let result = match task.await {
            Ok(result) => result.map(|()| frames.get()),
            Err(e) => {
                warn!("Animation task ended abnormally: {}", e);
                Ok(frames.get())
            }
        };
        drop(stop);
        result
    }
}

/// Start advancing the controls once every `interval` until stopped.
///
/// The loop never renders; rendering happens through the controls' change
/// subscription. Fails with `NotInitialized` when the viewer has no
/// controls. Must be called from within a `tokio::task::LocalSet`.
pub fn animate(state: Shared<ViewerState>, interval: Duration) -> ViewerResult<AnimationHandle> {
    spawn_loop(state, interval, None)
}

/// Like [`animate`], but the loop ends by itself after exactly `frames` frames.
pub fn animate_for(
    state: Shared<ViewerState>,
    interval: Duration,
    frames: u64,
) -> ViewerResult<AnimationHandle> {
    spawn_loop(state, interval, Some(frames))
}

fn spawn_loop(
    state: Shared<ViewerState>,
    interval: Duration,
    limit: Option<u64>,
) -> ViewerResult<AnimationHandle> {
    if state.borrow().controls().is_none() {
        return Err(ViewerError::not_initialized("controls"));
    }

    let (stop, mut stop_rx) = watch::channel(false);
    let frames = Rc::new(Cell::new(0));
    let counter = Rc::clone(&frames);

    let task = tokio::task::spawn_local(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("Animation loop started ({:?} per frame)", interval);

        while limit.is_none_or(|limit| counter.get() < limit) {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    state.borrow_mut().update_controls()?;
                    counter.set(counter.get() + 1);
                }
            }
        }

        debug!("Animation loop stopped after {} frames", counter.get());
        Ok::<(), ViewerError>(())
    });

    Ok(AnimationHandle {
        stop,
        frames,
        task,
    })
}
