#![cfg_attr(not(test), no_std)]

//! gantry - Parameter registry and configuration persistence for motion controllers
//!
//! This crate puts the platform-agnostic registry from `gantry_core` behind a
//! text command front end and keeps its persisted values in Flash.

// Platform abstraction layer (Flash access)
pub mod platform;

// Core services (logging, parameter persistence)
pub mod core;

// Build-time capability selection
pub mod config;

// Text command front end
pub mod command;

pub use command::Controller;
pub use gantry_core;
