//! Core firmware services
//!
//! Logging macros and parameter persistence shared by the command front end.

pub mod logging;
pub mod parameters;
