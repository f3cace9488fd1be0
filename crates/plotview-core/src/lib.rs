//! # PlotView Core
//!
//! Core types and utilities for PlotView.
//! Provides the error taxonomy, the plot point data model, shared handle
//! aliases and listener subscription ids used by the viewer crates.

pub mod data;
pub mod error;
pub mod listener;
pub mod types;

pub use data::{load_plot_points, parse_plot_points, sample_plot_points, PlotPoint};
pub use error::{DataError, Error, Result, ViewerError, ViewerResult};
pub use listener::SubscriptionId;
pub use types::{shared, Listener, Shared};
