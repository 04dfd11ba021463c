//! threatwatch: terminal dashboard for a threat-detection backend.
//!
//! The library holds the dashboard controller core so the binary and the
//! integration tests share it.

pub mod activity;
pub mod api;
pub mod beacon;
pub mod charts;
pub mod cli;
pub mod controller;
pub mod display;
pub mod poller;
pub mod samples;
pub mod settings;
pub mod views;
