//! Utility and helper functions needed for:
//! - Error handling
//! - Fixed point and basis point arithmetic
//! - Type casting

pub mod common;
pub mod error;
