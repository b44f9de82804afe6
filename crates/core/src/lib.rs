//! gantry_core - Pure no_std parameter registry for gantry motion controllers
//!
//! This crate holds the platform-agnostic part of the registry: the
//! descriptor table, token resolution, group expansion and unit conversion,
//! together with the plain settings structs the table points into. It builds
//! and tests on the host without any feature flags.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Capabilities, not features**: Table shape follows a runtime [`Capabilities`] value
//!
//! # Modules
//!
//! - [`capabilities`]: Hardware feature set a table is built for
//! - [`machine`]: Backing storage for every parameter
//! - [`nv`]: Descriptor table, registry, group engine and text printing
//! - [`status`]: Status codes returned by registry operations
//! - [`units`]: Inch / millimeter conversion

#![no_std]

pub mod capabilities;
pub mod machine;
pub mod nv;
pub mod status;
pub mod units;

pub use capabilities::{CapabilityError, Capabilities, Platform};
pub use machine::{Machine, Target};
pub use nv::{NvList, NvObj, NvValue, Registry, TableError};
pub use status::Status;
pub use units::UnitsMode;
