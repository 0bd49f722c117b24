//! Hookwarden Core — hook interception engine for agent tool calls.
//!
//! Before and after a tool call, registered external programs ("hooks") may
//! observe, approve, deny or rewrite the call. This crate matches pending
//! calls against the configured hooks, runs each hook as a time-bounded child
//! process, folds their decisions into the effective call and emits one
//! telemetry record per invocation.

pub mod config;
pub mod env;
pub mod hooks;

pub use config::Config;
