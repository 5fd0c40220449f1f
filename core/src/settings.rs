//! Member settings kept in sync with the server.
//!
//! Theme is cosmetic and keeps the optimistic value when the server update
//! fails; every other setting changes how alarms are dismissed and rolls
//! back so the device never disagrees with the server for long.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::endpoint::Endpoint;
use crate::error::SyncError;
use crate::store::{CredentialStore, PrefValue, PreferenceStore};
use crate::sync::{FailurePolicy, Setting, SyncOutcome, SyncState, Synchronizer};
use crate::transport::Transport;
use crate::types::{MissionDifficulty, Theme};

pub const THEME_KEY: &str = "THEME";
pub const VOICE_KEY: &str = "VOICE_ID";
pub const MISSION_DIFFICULTY_KEY: &str = "MISSION_DIFFICULTY";
pub const MISSION_DURATION_KEY: &str = "MISSION_DURATION";
pub const SMART_BRIEFING_KEY: &str = "isSmartBriefing";

pub const DEFAULT_VOICE: &str = "default";
/// Seconds.
pub const DEFAULT_MISSION_DURATION: u32 = 60;

pub struct ThemeSetting;

impl Setting for ThemeSetting {
    type Value = Theme;
    const KEY: &'static str = THEME_KEY;
    const POLICY: FailurePolicy = FailurePolicy::KeepOptimistic;

    fn default_value() -> Theme {
        Theme::default()
    }

    fn encode(value: &Theme) -> PrefValue {
        PrefValue::Str(value.as_str().to_string())
    }

    fn decode(raw: &PrefValue) -> Option<Theme> {
        raw.as_str().and_then(Theme::parse)
    }

    fn endpoint(value: &Theme) -> Endpoint {
        Endpoint::UpdateTheme(*value)
    }
}

pub struct VoiceSetting;

impl Setting for VoiceSetting {
    type Value = String;
    const KEY: &'static str = VOICE_KEY;
    const POLICY: FailurePolicy = FailurePolicy::RollBack;

    fn default_value() -> String {
        DEFAULT_VOICE.to_string()
    }

    fn encode(value: &String) -> PrefValue {
        PrefValue::Str(value.clone())
    }

    fn decode(raw: &PrefValue) -> Option<String> {
        raw.as_str().map(str::to_string)
    }

    fn endpoint(value: &String) -> Endpoint {
        Endpoint::UpdateVoice(value.clone())
    }
}

pub struct MissionLevelSetting;

impl Setting for MissionLevelSetting {
    type Value = MissionDifficulty;
    const KEY: &'static str = MISSION_DIFFICULTY_KEY;
    const POLICY: FailurePolicy = FailurePolicy::RollBack;

    fn default_value() -> MissionDifficulty {
        MissionDifficulty::default()
    }

    fn encode(value: &MissionDifficulty) -> PrefValue {
        PrefValue::Str(value.as_str().to_string())
    }

    fn decode(raw: &PrefValue) -> Option<MissionDifficulty> {
        raw.as_str().and_then(MissionDifficulty::parse)
    }

    fn endpoint(value: &MissionDifficulty) -> Endpoint {
        Endpoint::UpdateMissionLevel(*value)
    }
}

pub struct MissionDurationSetting;

impl Setting for MissionDurationSetting {
    type Value = u32;
    const KEY: &'static str = MISSION_DURATION_KEY;
    const POLICY: FailurePolicy = FailurePolicy::RollBack;

    fn default_value() -> u32 {
        DEFAULT_MISSION_DURATION
    }

    fn encode(value: &u32) -> PrefValue {
        PrefValue::Int(i64::from(*value))
    }

    fn decode(raw: &PrefValue) -> Option<u32> {
        raw.as_int().and_then(|v| u32::try_from(v).ok())
    }

    fn endpoint(value: &u32) -> Endpoint {
        Endpoint::UpdateMissionDuration(*value)
    }
}

pub struct SmartBriefingSetting;

impl Setting for SmartBriefingSetting {
    type Value = bool;
    const KEY: &'static str = SMART_BRIEFING_KEY;
    const POLICY: FailurePolicy = FailurePolicy::RollBack;

    fn default_value() -> bool {
        false
    }

    fn encode(value: &bool) -> PrefValue {
        PrefValue::Bool(*value)
    }

    fn decode(raw: &PrefValue) -> Option<bool> {
        raw.as_bool()
    }

    fn endpoint(value: &bool) -> Endpoint {
        Endpoint::UpdateSmartBriefing(*value)
    }
}

/// View-model for the settings screen.
///
/// Each setter blocks for one round-trip when signed in. Screens that must
/// not block use the synchronizers directly through `apply`/`settle`.
pub struct SettingsModel {
    theme: Synchronizer<ThemeSetting>,
    voice: Synchronizer<VoiceSetting>,
    mission_level: Synchronizer<MissionLevelSetting>,
    mission_duration: Synchronizer<MissionDurationSetting>,
    smart_briefing: Synchronizer<SmartBriefingSetting>,
    transport: Arc<dyn Transport>,
}

impl SettingsModel {
    pub fn load(
        client: &ApiClient,
        transport: Arc<dyn Transport>,
        prefs: Arc<dyn PreferenceStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            theme: Synchronizer::load(client.clone(), prefs.clone(), credentials.clone()),
            voice: Synchronizer::load(client.clone(), prefs.clone(), credentials.clone()),
            mission_level: Synchronizer::load(client.clone(), prefs.clone(), credentials.clone()),
            mission_duration: Synchronizer::load(
                client.clone(),
                prefs.clone(),
                credentials.clone(),
            ),
            smart_briefing: Synchronizer::load(client.clone(), prefs, credentials),
            transport,
        }
    }

    pub fn theme(&self) -> Theme {
        *self.theme.value()
    }

    pub fn voice(&self) -> &str {
        self.voice.value()
    }

    pub fn mission_level(&self) -> MissionDifficulty {
        *self.mission_level.value()
    }

    pub fn mission_duration(&self) -> u32 {
        *self.mission_duration.value()
    }

    pub fn smart_briefing(&self) -> bool {
        *self.smart_briefing.value()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<SyncOutcome, SyncError> {
        self.theme.update(theme, self.transport.as_ref())
    }

    pub fn set_voice(&mut self, voice_id: &str) -> Result<SyncOutcome, SyncError> {
        self.voice
            .update(voice_id.to_string(), self.transport.as_ref())
    }

    pub fn set_mission_level(
        &mut self,
        level: MissionDifficulty,
    ) -> Result<SyncOutcome, SyncError> {
        self.mission_level.update(level, self.transport.as_ref())
    }

    pub fn set_mission_duration(&mut self, seconds: u32) -> Result<SyncOutcome, SyncError> {
        self.mission_duration
            .update(seconds, self.transport.as_ref())
    }

    pub fn set_smart_briefing(&mut self, enabled: bool) -> Result<SyncOutcome, SyncError> {
        self.smart_briefing
            .update(enabled, self.transport.as_ref())
    }

    /// First failure message across all settings, for a banner or toast.
    pub fn failure_message(&self) -> Option<&str> {
        self.theme
            .last_error()
            .or_else(|| self.voice.last_error())
            .or_else(|| self.mission_level.last_error())
            .or_else(|| self.mission_duration.last_error())
            .or_else(|| self.smart_briefing.last_error())
    }

    pub fn is_syncing(&self) -> bool {
        [
            self.theme.state(),
            self.voice.state(),
            self.mission_level.state(),
            self.mission_duration.state(),
            self.smart_briefing.state(),
        ]
        .contains(&SyncState::Applying)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryCredentials, MemoryStore};
    use crate::transport::testing::RecordingTransport;

    const OK: &str = r#"{"code":"OK","message":"updated","success":true,"result":null}"#;

    fn model(
        prefs: Arc<MemoryStore>,
        transport: Arc<RecordingTransport>,
        token: Option<&str>,
    ) -> SettingsModel {
        let creds = match token {
            Some(t) => MemoryCredentials::signed_in(t),
            None => MemoryCredentials::new(),
        };
        SettingsModel::load(
            &ApiClient::new("http://localhost:3000"),
            transport,
            prefs,
            Arc::new(creds),
        )
    }

    #[test]
    fn defaults_when_store_is_empty() {
        let m = model(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingTransport::new()),
            None,
        );
        assert_eq!(m.theme(), Theme::System);
        assert_eq!(m.voice(), DEFAULT_VOICE);
        assert_eq!(m.mission_level(), MissionDifficulty::Medium);
        assert_eq!(m.mission_duration(), DEFAULT_MISSION_DURATION);
        assert!(!m.smart_briefing());
        assert!(!m.is_syncing());
    }

    #[test]
    fn startup_reads_persisted_values() {
        let prefs = Arc::new(MemoryStore::new());
        prefs
            .set(MISSION_DIFFICULTY_KEY, PrefValue::Str("HIGH".into()))
            .unwrap();
        prefs.set(SMART_BRIEFING_KEY, PrefValue::Bool(true)).unwrap();
        prefs.set(MISSION_DURATION_KEY, PrefValue::Int(-5)).unwrap();

        let m = model(prefs, Arc::new(RecordingTransport::new()), None);
        assert_eq!(m.mission_level(), MissionDifficulty::High);
        assert!(m.smart_briefing());
        assert_eq!(m.mission_duration(), DEFAULT_MISSION_DURATION);
    }

    #[test]
    fn signed_out_changes_stay_local() {
        let prefs = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let mut m = model(prefs.clone(), transport.clone(), None);

        assert!(matches!(
            m.set_mission_level(MissionDifficulty::Low).unwrap(),
            SyncOutcome::LocalOnly
        ));
        assert!(matches!(
            m.set_smart_briefing(true).unwrap(),
            SyncOutcome::LocalOnly
        ));

        assert!(transport.calls().is_empty());
        assert_eq!(
            prefs.get(MISSION_DIFFICULTY_KEY),
            Some(PrefValue::Str("LOW".into()))
        );
        assert_eq!(prefs.get(SMART_BRIEFING_KEY), Some(PrefValue::Bool(true)));
    }

    #[test]
    fn mission_level_rolls_back_on_failure() {
        let prefs = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(503, "");
        let mut m = model(prefs.clone(), transport.clone(), Some("tok"));

        let outcome = m.set_mission_level(MissionDifficulty::High).unwrap();

        assert!(matches!(outcome, SyncOutcome::RolledBack(_)));
        assert_eq!(m.mission_level(), MissionDifficulty::Medium);
        assert_eq!(
            prefs.get(MISSION_DIFFICULTY_KEY),
            Some(PrefValue::Str("MEDIUM".into()))
        );
        assert_eq!(m.failure_message(), Some("server returned HTTP 503"));
    }

    #[test]
    fn theme_keeps_optimistic_value_on_failure() {
        let prefs = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::new());
        transport.fail("offline");
        let mut m = model(prefs.clone(), transport.clone(), Some("tok"));

        let outcome = m.set_theme(Theme::Dark).unwrap();

        assert!(matches!(outcome, SyncOutcome::Kept(_)));
        assert_eq!(m.theme(), Theme::Dark);
        assert_eq!(prefs.get(THEME_KEY), Some(PrefValue::Str("DARK".into())));
        assert!(m.failure_message().is_some());
    }

    #[test]
    fn every_setter_hits_its_endpoint() {
        let prefs = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::new());
        for _ in 0..5 {
            transport.respond(200, OK);
        }
        let mut m = model(prefs, transport.clone(), Some("tok"));

        assert!(m.set_theme(Theme::Light).unwrap().is_success());
        assert!(m.set_voice("calm-2").unwrap().is_success());
        assert!(m.set_mission_level(MissionDifficulty::Low).unwrap().is_success());
        assert!(m.set_mission_duration(120).unwrap().is_success());
        assert!(m.set_smart_briefing(true).unwrap().is_success());

        let urls: Vec<String> = transport.calls().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            [
                "http://localhost:3000/api/members/me/theme",
                "http://localhost:3000/api/members/me/voice",
                "http://localhost:3000/api/members/me/mission-level",
                "http://localhost:3000/api/members/me/mission-duration",
                "http://localhost:3000/api/members/me/smart-briefing",
            ]
        );
        assert_eq!(m.voice(), "calm-2");
        assert!(m.failure_message().is_none());
    }
}
