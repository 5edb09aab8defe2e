//! HTTP middleware stack for the console.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (`x-request-id`)
//! 4. Session layer (tower-sessions, in-memory store)
//! 5. Auth guard (route classification, redirect or 401)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{RequireSession, guard_middleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
