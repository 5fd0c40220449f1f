//! Composition root.
//!
//! `Lumo` wires one `ApiClient`, one `Transport`, one preference store and
//! one credential store together and hands shared references to the API
//! facade and the settings view-model. Tests build it from doubles with
//! `with_parts`.

use std::sync::Arc;

use tracing::info;

use crate::api::LumoApi;
use crate::client::ApiClient;
use crate::config::LumoConfig;
use crate::error::{ConfigError, StoreError};
use crate::settings::SettingsModel;
use crate::store::{clear_session, CredentialStore, FileStore, PreferenceStore};
use crate::transport::{Transport, UreqTransport};

pub struct Lumo {
    api: LumoApi,
    settings: SettingsModel,
    prefs: Arc<dyn PreferenceStore>,
    credentials: Arc<dyn CredentialStore>,
}

impl Lumo {
    /// Real network transport and a file-backed preference store.
    pub fn from_config(
        config: &LumoConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let prefs = Arc::new(FileStore::open(&config.storage.preferences_path)?);
        info!(base_url = %config.api.base_url, "building client");
        Ok(Self::with_parts(
            ApiClient::new(&config.api.base_url),
            Arc::new(UreqTransport::new()),
            prefs,
            credentials,
        ))
    }

    pub fn with_parts(
        client: ApiClient,
        transport: Arc<dyn Transport>,
        prefs: Arc<dyn PreferenceStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let settings =
            SettingsModel::load(&client, transport.clone(), prefs.clone(), credentials.clone());
        let api = LumoApi::new(client, transport, credentials.clone());
        Self {
            api,
            settings,
            prefs,
            credentials,
        }
    }

    pub fn api(&self) -> &LumoApi {
        &self.api
    }

    pub fn settings(&self) -> &SettingsModel {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsModel {
        &mut self.settings
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.session_token().is_some()
    }

    /// Clear every local preference and the session, then reload settings
    /// so the view shows defaults again. On a store failure nothing is
    /// signed out and the settings keep their values.
    pub fn logout(&mut self) -> Result<(), StoreError> {
        clear_session(self.prefs.as_ref(), self.credentials.as_ref())?;
        self.settings = SettingsModel::load(
            self.api.client(),
            self.api.transport(),
            self.prefs.clone(),
            self.credentials.clone(),
        );
        Ok(())
    }
}
