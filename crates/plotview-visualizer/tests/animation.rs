//! Animation loop lifecycle

use plotview_core::{shared, ViewerError};
use plotview_visualizer::{animate, animate_for, init, HeadlessHost, ViewerState};
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

const FRAME: Duration = Duration::from_millis(16);

async fn initialized() -> ViewerState {
    let mut host = HeadlessHost::default();
    let mut state = ViewerState::new();
    init(&mut state, 800, 600, &mut host, &[]).await.unwrap();
    state
}

#[tokio::test(start_paused = true)]
async fn test_animate_for_runs_exact_frame_count() {
    LocalSet::new()
        .run_until(async {
            for limit in [0, 1, 5, 30] {
                let state = shared(initialized().await);
                let handle = animate_for(Rc::clone(&state), FRAME, limit).unwrap();
                assert_eq!(handle.wait().await.unwrap(), limit);
                assert_eq!(Rc::strong_count(&state), 1);
            }
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_animate_runs_until_stopped() {
    LocalSet::new()
        .run_until(async {
            let state = shared(initialized().await);
            let handle = animate(Rc::clone(&state), FRAME).unwrap();

            // First tick fires at once, then one per frame interval.
            tokio::time::sleep(FRAME * 4 + FRAME / 2).await;
            assert!(handle.is_running());
            assert_eq!(handle.frames(), 5);

            assert_eq!(handle.join().await.unwrap(), 5);
            assert_eq!(Rc::strong_count(&state), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_animate_never_renders_without_change() {
    LocalSet::new()
        .run_until(async {
            let state = shared(initialized().await);
            animate_for(Rc::clone(&state), FRAME, 10)
                .unwrap()
                .wait()
                .await
                .unwrap();

            let state = state.borrow();
            let renderer = state.renderer().unwrap().borrow();
            assert_eq!(renderer.frames_rendered(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_animate_applies_queued_input() {
    LocalSet::new()
        .run_until(async {
            let state = shared(initialized().await);
            state.borrow_mut().wheel(-400.0).unwrap();

            animate_for(Rc::clone(&state), FRAME, 3)
                .unwrap()
                .wait()
                .await
                .unwrap();

            let state = state.borrow();
            let z = state.camera_position().unwrap().z;
            assert!((z - 44.0).abs() < 1e-3);
            assert_eq!(state.renderer().unwrap().borrow().frames_rendered(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_loop() {
    LocalSet::new()
        .run_until(async {
            let state = shared(initialized().await);
            let handle = animate(Rc::clone(&state), FRAME).unwrap();
            tokio::time::sleep(FRAME * 2).await;
            drop(handle);

            tokio::task::yield_now().await;
            tokio::time::sleep(FRAME).await;
            assert_eq!(Rc::strong_count(&state), 1);
        })
        .await;
}

#[tokio::test]
async fn test_animate_without_controls_fails() {
    LocalSet::new()
        .run_until(async {
            let err = animate(shared(ViewerState::new()), FRAME).unwrap_err();
            assert_eq!(err, ViewerError::not_initialized("controls"));

            let err = animate_for(shared(ViewerState::new()), FRAME, 3).unwrap_err();
            assert!(matches!(err, ViewerError::NotInitialized { component: "controls" }));
        })
        .await;
}
