//! Component D: the API transport (§4.4), grounded on the teacher's
//! `api.rs` `reqwest::blocking::Client` usage and typed JSON decoding,
//! generalized from a single chat-completion call to a paginated,
//! GitLab-shaped REST entity model. Retry/backoff is intentionally not
//! part of this layer (§4.4.5: "Retries are not part of this core; the
//! caller decides") — a deliberate divergence from the teacher's own
//! `retry_api_call`, recorded in DESIGN.md.

mod auth;
mod client;
mod entity;
mod pagination;
mod params;

pub use auth::{AuthInterceptor, Credential, CredentialIssuer, CredentialKind, StaticCredential};
pub use client::{CancellationToken, Client};
pub use entity::{MergeRequest, MergeRequestState};
pub use params::Params;
