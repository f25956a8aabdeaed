//! ESP32 firmware-specific modules for co2mon
//!
//! This crate contains the code that only compiles for the target: pin
//! assignments, peripheral bring-up and the concrete types the embassy tasks
//! are instantiated with.

#![no_std]

pub mod board;
