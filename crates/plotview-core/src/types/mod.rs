//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Rc<RefCell<T>>` handles and listener callbacks.

pub mod aliases;

pub use aliases::*;
