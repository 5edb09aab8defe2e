//! ChimaX/Zeolive admin console library.
//!
//! This crate provides the console as a library so the router can be
//! exercised end to end against a mocked backend.
//!
//! # Security
//!
//! The console holds operator credentials for the legacy admin API, the v2
//! API and the identity provider. Bearer tokens never leave the server: the
//! browser only receives an opaque session cookie.
//!
//! # Modules
//!
//! - [`session`] - Injected session context (single writer, many readers)
//! - [`api`] - Outbound client for both backends
//! - [`identity`] - Identity provider client and principal watch
//! - [`auth`] - Login, register, logout and profile checks
//! - [`guard`] - Route classification and the auth guard state machine
//! - [`resource`] - Generic list state and CRUD for backend collections
//! - [`notify`] - Toast notifications raised by operations
//! - [`routes`] - HTTP handlers and the router

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod middleware;
pub mod notify;
pub mod resource;
pub mod routes;
pub mod session;
pub mod state;
