//! Mock platform implementation for testing
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```ignore
//! use gantry::platform::mock::MockFlash;
//! use gantry::platform::traits::FlashInterface;
//!
//! let mut flash = MockFlash::new();
//! flash.erase(0x040000, 4096).unwrap();
//! flash.write(0x040000, b"GNTR").unwrap();
//! ```

#![cfg(any(test, feature = "mock"))]

mod flash;

pub use flash::MockFlash;
