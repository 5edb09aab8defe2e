//! Core types for the ChimaX console.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod session;

pub use email::{Email, EmailError};
pub use id::*;
pub use session::{Access, AdminProfile, Permission, Session, keys as session_keys};
