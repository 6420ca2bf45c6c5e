//! Station directory API client.

mod client;

pub use client::{StationClient, StationPage};
