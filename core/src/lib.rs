//! Client core for the Lumo alarm backend.
//!
//! # Overview
//! Two pieces: a typed endpoint client that turns `Endpoint` descriptors
//! into HTTP calls and typed results, and a generic optimistic synchronizer
//! that applies setting changes locally before confirming them with the
//! server.
//!
//! # Design
//! - `ApiClient` is stateless; `build`/`parse` keep the I/O boundary
//!   explicit and `Transport` is the only thing that touches the network.
//! - Every failure is a typed `ApiError` value; nothing panics across the
//!   network boundary.
//! - No process-wide singletons: `app::Lumo` builds one client, transport
//!   and store set and injects them.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod logging;
pub mod settings;
pub mod store;
pub mod sync;
pub mod transport;
pub mod types;

pub use api::LumoApi;
pub use app::Lumo;
pub use client::ApiClient;
pub use config::LumoConfig;
pub use endpoint::{Endpoint, Params};
pub use error::{ApiError, ConfigError, StoreError, SyncError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use settings::SettingsModel;
pub use store::{CredentialStore, FileStore, MemoryCredentials, MemoryStore, PrefValue, PreferenceStore};
pub use sync::{Applied, FailurePolicy, PendingUpdate, Setting, SyncOutcome, SyncState, Synchronizer};
pub use transport::{Transport, UreqTransport};
pub use types::{Alarm, Envelope, Todo, TodoInput};

/// Outcome of one endpoint call.
pub type RequestOutcome<T> = Result<T, ApiError>;
