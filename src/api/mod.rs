//! HTTP API for patient records, consultations and triage.
//!
//! Routes live under `/api/v1/` (plus a banner at `/`). Handlers are thin:
//! they validate input, call the record modules or the triage coordinator,
//! and map failures to structured JSON errors.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
