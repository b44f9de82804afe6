//! Parameter persistence
//!
//! Registry values are stored in Flash with redundant block rotation for
//! wear leveling. The registry itself lives in `gantry_core::nv`.

pub mod block;
pub mod crc;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use block::{hash_token, BlockHeader, Record, RecordFlags, MAX_RECORDS};
pub use crc::{calculate_crc32, validate_crc32};
pub use storage::{BlockStorage, StorageStats, PARAM_BLOCK_ADDRESSES};
pub use store::{DefaultsReason, LoadOutcome, NvStore, PersistError};
