//! Core types for Storekeep.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod color;
pub mod id;
pub mod price;
pub mod user;

pub use color::{HexColor, HexColorError};
pub use id::*;
pub use price::{Price, PriceError};
pub use user::{UserId, UserIdError};
