//! # od-protocol
//!
//! Core protocol definitions and data models for opsdesk.
//!
//! This crate defines all shared data structures used for:
//! - Sync pipeline status as reported by the server
//! - Task chat messages and typing state
//! - Real-time channel frames
//! - Inter-process communication between the dashboard and Core
//! - Configuration file parsing
//!
//! ## Modules
//!
//! - [`pipeline_models`]: Pipeline runs, steps, and start requests
//! - [`message_models`]: Task messages, typing indicator, chat state
//! - [`realtime`]: Frames exchanged over the real-time connection
//! - [`view_models`]: Client-side pipeline view state
//! - [`ipc`]: Operations and Events for Core-dashboard communication
//! - [`config_models`]: Settings from config.toml
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, chrono, and uuid
//! - TypeScript generation: All types derive `TS` for web client compatibility
//! - Independent compilation: No dependencies on other opsdesk crates

pub mod config_models;
pub mod ipc;
pub mod message_models;
pub mod pipeline_models;
pub mod realtime;
pub mod view_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use message_models::*;
pub use pipeline_models::*;
pub use realtime::*;
pub use view_models::*;
