//! Shared library surface for the route-planning server and its tests.

pub mod api;
pub mod config;
pub mod resolve;
pub mod state;
