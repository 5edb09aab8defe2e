//! ChimaX Core - Shared types library.
//!
//! This crate provides the types shared by the admin console and its tests:
//! - `admin` - The console service (sessions, auth guard, resource collections)
//! - `integration-tests` - End-to-end tests against a mocked backend
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! Everything the console knows about the backend's wire shapes lives here:
//! the response envelope, the per-resource endpoint configuration, the
//! entity payloads, and the form schemas checked before any network call.
//!
//! # Modules
//!
//! - [`types`] - Ids, emails, session and permission model
//! - [`envelope`] - Backend response envelope, parsed once into a `Result`
//! - [`resource`] - Resource configuration and the [`Entity`] trait
//! - [`entities`] - Concrete backend collections (coin plans, hashtags, ...)
//! - [`validation`] - Client-side form schemas

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entities;
pub mod envelope;
pub mod resource;
pub mod types;
pub mod validation;

pub use envelope::{Envelope, EnvelopeError, Payload};
pub use resource::{Backend, Endpoints, Entity, InsertPosition, ResourceConfig, UnsafeSegment};
pub use types::*;
pub use validation::{FieldError, FieldRule, Rule, ValidationErrors, ValidationMode};
