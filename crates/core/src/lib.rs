//! # od-core
//!
//! Client core for opsdesk: watches and controls channel sync pipelines and
//! runs the per-task chat.
//!
//! This crate provides:
//! - Configuration loading from the `.opsdesk/` directory
//! - REST clients for the pipeline and task message endpoints
//! - The pipeline status controller and its rendering contract
//! - The task chat with live updates and typing indicators
//! - The shared real-time connection
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`api`]: REST client traits and the HTTP implementation
//! - [`pipeline`]: Status polling, actions and view derivation
//! - [`messaging`]: Task chat state and de-duplication
//! - [`realtime`]: Room membership and WebSocket transport
//! - [`session`]: Routing of UI operations
//! - [`timer`]: Optional deadlines for `select!` loops

pub mod api;
pub mod config;
pub mod messaging;
pub mod pipeline;
pub mod realtime;
pub mod session;
pub mod timer;
