//! Pod diagnosis agent
//!
//! HTTP front-end over `diag_lib::Diagnoser`. The binary wires these
//! modules to a live cluster; tests drive the router directly.

pub mod api;
pub mod config;
