//! State models for bulk action UIs.
//!
//! These types hold no rendering logic. A selection toolbar and a progress
//! modal can be drawn by any UI layer from the state exposed here.

mod action_bar;
mod handler;
mod progress_view;

pub use action_bar::{
    ActionBarError, ActionRequest, ActionVariant, BulkAction, BulkActionBar, Confirmation,
};
pub use handler::HandlerOutput;
pub use progress_view::{ProgressRow, ProgressView, StatusCounts};
