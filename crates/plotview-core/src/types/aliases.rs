//! Type aliases for the viewer's shared handles.
//!
//! The viewer runs on a single UI thread. Camera, scene, renderer and the
//! renderer's output surface are each referenced from more than one place
//! (the viewer state, the trackball controls, change listeners), so they
//! live behind `Rc<RefCell<T>>`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plotview_core::types::*;
//!
//! let camera: Shared<PerspectiveCamera> = shared(PerspectiveCamera::default());
//! camera.borrow_mut().set_position(0.0, 0.0, 50.0);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
pub type Shared<T> = Rc<RefCell<T>>;

/// A single-threaded listener receiving one event by reference.
///
/// Listeners are invoked on the thread that emitted the event and may
/// capture `Shared` handles.
pub type Listener<T> = Box<dyn Fn(&T)>;

/// Create a new `Shared<T>` from a value.
///
/// # Example
/// ```rust,ignore
/// let scene = shared(Scene::new());
/// ```
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
