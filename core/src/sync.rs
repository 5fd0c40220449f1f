//! Optimistic setting synchronizer.
//!
//! # Overview
//! A setting change is applied to the observable value and the preference
//! store first, then sent to the server. The server round-trip may lag or
//! fail without blocking the locally visible value; on failure the
//! setting's `FailurePolicy` decides between rolling back and keeping the
//! optimistic value.
//!
//! # Design
//! - One `Synchronizer` per setting key, generic over a `Setting`
//!   description (key, codec, endpoint factory, policy).
//! - The round-trip is split like `ApiClient`: `apply` returns the request
//!   to execute, `settle` consumes its result. The owner thread calls both;
//!   the I/O may happen anywhere in between.
//! - Every `apply` bumps a per-key generation. A completion whose
//!   generation is no longer current is discarded, so racing updates to the
//!   same key resolve to the newest one regardless of completion order.
//! - Rollback restores the last value the server accepted, not the value
//!   just before the failed update. A stale success still advances that
//!   value, and once the newest update has rolled back a stale completion
//!   re-aligns the local value with it.
//! - No timeout and no cancellation: a pending update stays `Applying`
//!   until its result is settled.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::client::ApiClient;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, SyncError};
use crate::http::{HttpRequest, HttpResponse};
use crate::store::{CredentialStore, PrefValue, PreferenceStore};
use crate::transport::Transport;
use crate::types::Envelope;

/// What to do with the optimistic value when the server update fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Restore the last server-accepted value in memory and in the store.
    RollBack,
    /// Keep the new value locally; only record the error.
    KeepOptimistic,
}

/// Static description of one synchronized setting.
pub trait Setting {
    type Value: Clone + PartialEq + fmt::Debug;

    /// Preference store key.
    const KEY: &'static str;
    const POLICY: FailurePolicy;

    fn default_value() -> Self::Value;

    fn encode(value: &Self::Value) -> PrefValue;

    /// `None` when the stored value has the wrong type or an unknown tag.
    fn decode(raw: &PrefValue) -> Option<Self::Value>;

    /// The server call that persists `value`.
    fn endpoint(value: &Self::Value) -> Endpoint;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Applying,
    Confirmed,
    RolledBack,
    /// Server update failed and the optimistic value was kept.
    Failed,
}

/// Terminal result of one update.
#[derive(Debug)]
pub enum SyncOutcome {
    /// No session token; the local write is the whole update.
    LocalOnly,
    Confirmed,
    RolledBack(ApiError),
    Kept(ApiError),
    /// A newer update to the same key superseded this one.
    Stale,
}

impl SyncOutcome {
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            SyncOutcome::RolledBack(e) | SyncOutcome::Kept(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::LocalOnly | SyncOutcome::Confirmed)
    }
}

/// An update waiting for its server round-trip.
#[derive(Debug)]
pub struct PendingUpdate<V> {
    generation: u64,
    value: V,
    request: HttpRequest,
}

impl<V> PendingUpdate<V> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The value this update sends.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The authorized request to hand to a `Transport`.
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }
}

/// Result of the synchronous half of an update.
#[derive(Debug)]
pub enum Applied<V> {
    Done(SyncOutcome),
    Pending(PendingUpdate<V>),
}

pub struct Synchronizer<S: Setting> {
    value: S::Value,
    /// Last value the server accepted, or the loaded value.
    confirmed: S::Value,
    state: SyncState,
    generation: u64,
    last_error: Option<String>,
    client: ApiClient,
    prefs: Arc<dyn PreferenceStore>,
    credentials: Arc<dyn CredentialStore>,
    _setting: PhantomData<S>,
}

impl<S: Setting> Synchronizer<S> {
    /// Initialize from the preference store, falling back to the default.
    pub fn load(
        client: ApiClient,
        prefs: Arc<dyn PreferenceStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let value = match prefs.get(S::KEY) {
            Some(raw) => S::decode(&raw).unwrap_or_else(|| {
                warn!(key = S::KEY, stored = ?raw, "ignoring undecodable preference");
                S::default_value()
            }),
            None => S::default_value(),
        };
        Self {
            confirmed: value.clone(),
            value,
            state: SyncState::Idle,
            generation: 0,
            last_error: None,
            client,
            prefs,
            credentials,
            _setting: PhantomData,
        }
    }

    pub fn value(&self) -> &S::Value {
        &self.value
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Message of the most recent failed update, cleared by the next `apply`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply `new` locally and prepare the server update.
    ///
    /// A failed local write restores the previous value and returns the
    /// error without touching the network.
    pub fn apply(&mut self, new: S::Value) -> Result<Applied<S::Value>, SyncError> {
        let previous = std::mem::replace(&mut self.value, new.clone());
        if let Err(e) = self.prefs.set(S::KEY, S::encode(&new)) {
            warn!(key = S::KEY, error = %e, "local write failed, update abandoned");
            self.value = previous;
            return Err(e.into());
        }
        self.generation += 1;
        self.last_error = None;
        info!(key = S::KEY, value = ?new, generation = self.generation, "setting applied");

        let Some(token) = self.credentials.session_token() else {
            debug!(key = S::KEY, "no session, local-only update");
            self.confirmed = new;
            self.state = SyncState::Confirmed;
            return Ok(Applied::Done(SyncOutcome::LocalOnly));
        };

        self.state = SyncState::Applying;
        match self.client.build(&S::endpoint(&new)) {
            Ok(request) => Ok(Applied::Pending(PendingUpdate {
                generation: self.generation,
                value: new,
                request: request.with_bearer(&token),
            })),
            Err(e) => Ok(Applied::Done(self.fail(e))),
        }
    }

    /// Reconcile the server's answer to `pending`.
    pub fn settle(
        &mut self,
        pending: PendingUpdate<S::Value>,
        response: Result<HttpResponse, ApiError>,
    ) -> SyncOutcome {
        if pending.generation != self.generation {
            return self.settle_stale(pending, response);
        }

        match self.acknowledge(response) {
            Ok(()) => {
                info!(key = S::KEY, generation = pending.generation, "setting confirmed");
                self.confirmed = pending.value;
                self.state = SyncState::Confirmed;
                SyncOutcome::Confirmed
            }
            Err(e) => self.fail(e),
        }
    }

    /// A superseded update completed. It never overrides a newer confirmed
    /// value, but it does move `confirmed` and, after a rollback, the local
    /// value along with what the server now holds.
    fn settle_stale(
        &mut self,
        pending: PendingUpdate<S::Value>,
        response: Result<HttpResponse, ApiError>,
    ) -> SyncOutcome {
        debug!(
            key = S::KEY,
            generation = pending.generation,
            current = self.generation,
            "stale completion"
        );
        let settled_newer = self.state == SyncState::Confirmed;
        match self.acknowledge(response) {
            Ok(()) if !settled_newer => {
                self.confirmed = pending.value;
                if self.state == SyncState::RolledBack {
                    info!(key = S::KEY, value = ?self.confirmed, "late confirmation, re-aligning");
                    self.restore_confirmed();
                    self.state = SyncState::Confirmed;
                }
            }
            Ok(()) => {}
            Err(e) => {
                warn!(key = S::KEY, generation = pending.generation, error = %e, "superseded update failed");
                if !settled_newer {
                    self.last_error = Some(e.to_string());
                }
            }
        }
        SyncOutcome::Stale
    }

    fn acknowledge(&self, response: Result<HttpResponse, ApiError>) -> Result<(), ApiError> {
        response
            .and_then(|r| self.client.parse::<Envelope<serde_json::Value>>(r))
            .and_then(|envelope| envelope.acknowledge())
            .map(|_| ())
    }

    fn restore_confirmed(&mut self) {
        if let Err(store_err) = self.prefs.set(S::KEY, S::encode(&self.confirmed)) {
            error!(key = S::KEY, error = %store_err, "rollback write failed");
        }
        self.value = self.confirmed.clone();
    }

    /// `apply`, one blocking round-trip, `settle`.
    pub fn update(
        &mut self,
        new: S::Value,
        transport: &dyn Transport,
    ) -> Result<SyncOutcome, SyncError> {
        match self.apply(new)? {
            Applied::Done(outcome) => Ok(outcome),
            Applied::Pending(pending) => {
                let response = transport.execute(pending.request());
                Ok(self.settle(pending, response))
            }
        }
    }

    fn fail(&mut self, err: ApiError) -> SyncOutcome {
        self.last_error = Some(err.to_string());
        match S::POLICY {
            FailurePolicy::RollBack => {
                warn!(key = S::KEY, error = %err, restored = ?self.confirmed, "server update failed, rolling back");
                self.restore_confirmed();
                self.state = SyncState::RolledBack;
                SyncOutcome::RolledBack(err)
            }
            FailurePolicy::KeepOptimistic => {
                warn!(key = S::KEY, error = %err, "server update failed, keeping local value");
                self.state = SyncState::Failed;
                SyncOutcome::Kept(err)
            }
        }
    }
}

impl<S: Setting> fmt::Debug for Synchronizer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("key", &S::KEY)
            .field("value", &self.value)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}
