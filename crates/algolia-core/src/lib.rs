//! # Algolia Core
//!
//! Request dispatch for the Algolia hosted search API.
//!
//! ## Overview
//!
//! - **Host failover** across ordered build (write) and query (read) host lists
//! - **Per-request auth and timeouts**, including rate-limit forwarding
//! - **Response classification** into success, soft (next host) and terminal failures
//! - **Secured API keys** derived with HMAC-SHA256
//! - **Thin account operations** (indexes, keys, logs, batches) on top of the above
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | `SearchClient` and its builder |
//! | [`config`] | Identity, timeouts, forwarding, per-call configuration snapshot |
//! | [`dispatcher`] | Single-host attempt and outcome classification |
//! | [`error`] | Client error taxonomy |
//! | [`failover`] | Ordered host failover |
//! | [`hosts`] | Build/query host lists and default host policy |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`index`] | Per-index handle |
//! | [`operations`] | Account-level API operations |
//! | [`query`] | Search parameters and query-string encoding |
//! | [`signer`] | HMAC signing and secured API keys |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use algolia_core::{Query, SearchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SearchClient::new("APPID", "api-key")?;
//!
//!     let hits = client
//!         .init_index("products")
//!         .search(&Query::new().query("running shoes").hits_per_page(10))
//!         .await?;
//!     println!("{hits}");
//!
//!     let public_key = client.generate_secured_api_key(
//!         "search-only-key",
//!         &Query::new().filters("visibility:public"),
//!         Some("user-42"),
//!     )?;
//!     println!("{public_key}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ Operations / Index   │
//! └──────────┬───────────┘
//!            │ verb, path, body, build?, search?
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ SearchClient         │────▶│ Config snapshot  │
//! └──────────┬───────────┘     └──────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ Failover (host list) │────▶│ Dispatcher       │
//! └──────────────────────┘     └────────┬─────────┘
//!                                       ▼
//!                              ┌──────────────────┐
//!                              │ HTTP Client      │
//!                              │ (reqwest/mock)   │
//!                              └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use algolia_core::ClientError;
//!
//! fn describe(error: &ClientError) -> &'static str {
//!     match error {
//!         ClientError::Api { .. } => "the request was rejected",
//!         ClientError::HostsUnreachable { .. } => "the service was unreachable",
//!         _ => "the call failed",
//!     }
//! }
//! ```
//!
//! ## Concurrency
//!
//! A call tries hosts one after another, never in parallel. `SearchClient` is
//! `Send + Sync`; setters may be called while other calls are in flight and
//! only affect calls started afterwards.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod failover;
pub mod hosts;
pub mod http_client;
pub mod index;
pub mod operations;
pub mod query;
pub mod signer;

// Client
pub use client::{SearchClient, SearchClientBuilder};

// Configuration
pub use config::{ClientIdentity, ForwardingContext, RequestConfig, TimeoutProfile};

// Dispatch and failover
pub use dispatcher::{Dispatcher, RequestOutcome, Verb};
pub use failover::{execute_with_failover, FailoverSuccess};

// Error types
pub use error::{ClientError, FailureReason, HostFailure};

// Hosts
pub use hosts::{HostSet, TlsCapability};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Operations
pub use index::Index;
pub use operations::{IndexQuery, LogType, MultipleQueriesStrategy, UserKeyParams};

// Query encoding and secured keys
pub use query::{decode_query_string, Query};
pub use signer::{
    generate_secured_api_key, generate_secured_api_key_from_tag_filters, sign, SecuredApiKey,
};
