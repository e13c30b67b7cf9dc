//! Voice skill interface for shoplist
//!
//! This crate turns voice-platform requests into list-backend calls and
//! spoken answers:
//! - **Envelope** (`envelope`) - request/response JSON as the platform sends and expects it
//! - **Session** (`session`) - per-session `launched` flag and its store
//! - **Speech** (`speech`) - utterance formatting
//! - **Router** (`router`) - intent dispatch, backend calls, error handler
//!
//! # Architecture
//!
//! ```text
//! RequestEnvelope → SessionStore::load → IntentRouter::route → ListBackend
//!                                              ↓
//!                       ResponseEnvelope ← SkillResponse
//! ```

pub mod envelope;
pub mod router;
pub mod session;
pub mod speech;

pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use router::{IntentRouter, RequestContext, RouteError};
pub use session::{SessionContext, SessionStore};
pub use speech::{ResponseBuilder, SkillResponse};
