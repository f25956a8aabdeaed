//! Hardware-independent core library for co2mon
//!
//! This crate contains all platform-agnostic logic for the SCD41 monitor:
//! the sensor abstraction, the shared reading history and its locking
//! discipline, rolling statistics, the sampling and UI refresh loops, button
//! debouncing and the widget rendering used by both the firmware and the
//! desktop simulator.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32) and
//! desktop hosts (for the simulator and tests).

#![no_std]

pub mod app_state;
pub mod config;
pub mod input;
pub mod metrics;
pub mod sampling;
pub mod sensors;
pub mod stats;
pub mod ui;
pub mod ui_refresh;
