//! ---
//! fl_section: "01-core-functionality"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Shared primitives and utilities for the messaging runtime."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
//! Shared primitives for the framelink workspace.
//! This crate exposes configuration loading and tracing setup consumed by the
//! messaging core and the operator CLI.

pub mod config;
pub mod logging;

pub use config::{BridgeConfig, LoadedBridgeConfig, LoggingConfig, MessagingConfig};
pub use logging::{init, init_tracing, LogFormat, LogStream};
