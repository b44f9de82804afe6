//! Parameter registry
//!
//! A flat namespace of short tokens through which every machine parameter is
//! read, written, displayed and persisted.
//!
//! # Table layout
//!
//! The table is partitioned, in order, into single-valued entries (ending in
//! the persisted status report slot run), group markers and uber-group
//! markers. Boundaries are derived from the entries' [`EntryKind`] tags when
//! the registry is built and the layout is checked once, so a malformed table
//! is rejected rather than misclassified.
//!
//! # Modules
//!
//! - [`descriptor`]: table entries and their get/set/print variants
//! - [`object`]: per-request value objects and lists
//! - [`table`]: builds the table for a set of [`Capabilities`](crate::Capabilities)
//! - [`registry`]: boundaries, token resolution and get/set dispatch
//! - [`groups`]: group and uber-group expansion
//! - [`print`]: text rendering and the responder seam

pub mod descriptor;
pub mod groups;
pub mod object;
pub mod print;
pub mod registry;
pub mod table;

pub use descriptor::{
    Action, Descriptor, EntryKind, GetOp, NvFlags, PrintOp, SetOp, UberGroup, UnitsLabel,
};
pub use groups::{do_group_list, group_is_prefixed};
pub use object::{add_conditional_message, MessageQueue, NvList, NvObj, NvValue, ValueType};
pub use print::{JsonFormat, Responder, Response, TextFormat, TextResponder};
pub use registry::{Boundaries, Partition, Registry};

/// Registry position
pub type Index = u16;

/// Longest token, group prefix included
pub const TOKEN_LEN: usize = 6;

/// Longest group name
pub const GROUP_LEN: usize = 4;

/// Characters compared when resolving a token
pub const TOKEN_SIGNIFICANT: usize = TOKEN_LEN - 1;

/// Objects in one request body
pub const NV_LIST_LEN: usize = 48;

/// Upper bound on objects handled in one expansion
pub const NV_MAX_OBJECTS: usize = NV_LIST_LEN - 2;

/// Longest string value
pub const NV_STRING_LEN: usize = 64;

/// Longest queued message
pub const NV_MESSAGE_LEN: usize = 64;

/// Messages queued per request
pub const NV_MESSAGE_COUNT: usize = 2;

/// Capacity of the table
pub const MAX_ENTRIES: usize = 600;

/// Structural table errors found while building the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// Capabilities outside the supported range
    Capabilities(crate::CapabilityError),
    /// More entries than the table holds
    TooManyEntries,
    TokenTooLong,
    GroupTooLong,
    /// Token appears twice
    DuplicateToken(Index),
    /// An earlier entry resolves for this token
    Shadowed(Index),
    /// Entry kinds are out of partition order
    PartitionOrder(Index),
    /// Status report slot run is split or the wrong length
    StatusReportRun,
    /// A grouped entry names a group with no marker
    MissingGroup(Index),
    /// A group marker itself carries a group
    NestedGroup(Index),
}

impl core::fmt::Display for TableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TableError::Capabilities(e) => write!(f, "unsupported capabilities: {}", e),
            TableError::TooManyEntries => write!(f, "table capacity exceeded"),
            TableError::TokenTooLong => write!(f, "token empty or longer than {}", TOKEN_LEN),
            TableError::GroupTooLong => write!(f, "group longer than {}", GROUP_LEN),
            TableError::DuplicateToken(i) => write!(f, "duplicate token at {}", i),
            TableError::Shadowed(i) => write!(f, "entry {} shadowed by an earlier token", i),
            TableError::PartitionOrder(i) => write!(f, "entry {} out of partition order", i),
            TableError::StatusReportRun => write!(f, "status report slot run malformed"),
            TableError::MissingGroup(i) => write!(f, "entry {} names a missing group", i),
            TableError::NestedGroup(i) => write!(f, "group marker {} has a group", i),
        }
    }
}

impl From<crate::CapabilityError> for TableError {
    fn from(e: crate::CapabilityError) -> Self {
        TableError::Capabilities(e)
    }
}
