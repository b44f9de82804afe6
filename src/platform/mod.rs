//! Platform abstraction layer
//!
//! Hardware access needed by the parameter store. Board support crates
//! implement the traits; the mock implementation backs the tests.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{FlashError, PlatformError, Result};
pub use traits::FlashInterface;
