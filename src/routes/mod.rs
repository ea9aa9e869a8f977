//! HTTP boundary: explicit request/response schemas per endpoint, validated
//! before anything reaches the domain components.

pub mod auth;
pub mod posts;
pub mod search;
pub mod users;
pub mod ws;
