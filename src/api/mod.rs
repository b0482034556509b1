//! API Module
//!
//! HTTP gateway exposing the cache over a small REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value, optionally with a TTL
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /purge` - Remove every key
//! - `GET /ttl/:key` - Remaining time to live of a key
//! - `GET /health` - Store liveness

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use handlers::*;
pub use routes::create_router;
