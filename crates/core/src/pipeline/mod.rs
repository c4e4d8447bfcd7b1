//! Pipeline status view: the polling controller and its rendering contract.

pub mod controller;
pub mod view;

pub use controller::{
    action_allowed, rejection_reason, ControllerError, ControllerOptions, PipelineController,
};
pub use view::PipelineView;
