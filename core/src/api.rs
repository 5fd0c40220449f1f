//! Typed access to every Lumo resource.
//!
//! `LumoApi` is built once at the composition root and handed to whatever
//! needs it. It attaches the session token when one exists and unwraps the
//! response envelope for the endpoints that use it.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::client::ApiClient;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::store::CredentialStore;
use crate::transport::Transport;
use crate::types::{
    Alarm, AlarmInput, AlarmLog, AlarmSound, Envelope, HomeInfo, MissionResult, MissionSession,
    MissionSettings, MissionSubmission, RepeatDays, SnoozeSettings, Todo, TodoBriefing, TodoInput,
    WalkDistance, WalkProgress,
};

#[derive(Clone)]
pub struct LumoApi {
    client: ApiClient,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
}

impl LumoApi {
    pub fn new(
        client: ApiClient,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            transport,
            credentials,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    fn call<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, ApiError> {
        let token = self.credentials.session_token();
        self.client
            .send(self.transport.as_ref(), &endpoint, token.as_deref())
    }

    fn call_enveloped<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, ApiError> {
        let token = self.credentials.session_token();
        self.client
            .send_enveloped(self.transport.as_ref(), &endpoint, token.as_deref())
    }

    fn call_acknowledged(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        self.call::<Envelope<serde_json::Value>>(endpoint)?
            .acknowledge()
            .map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Alarms
    // -----------------------------------------------------------------------

    pub fn list_alarms(&self) -> Result<Vec<Alarm>, ApiError> {
        self.call(Endpoint::ListAlarms)
    }

    pub fn alarm(&self, id: i64) -> Result<Alarm, ApiError> {
        self.call(Endpoint::GetAlarm(id))
    }

    pub fn create_alarm(&self, input: AlarmInput) -> Result<Alarm, ApiError> {
        self.call(Endpoint::CreateAlarm(input))
    }

    pub fn update_alarm(&self, id: i64, input: AlarmInput) -> Result<Alarm, ApiError> {
        self.call(Endpoint::UpdateAlarm(id, input))
    }

    pub fn delete_alarm(&self, id: i64) -> Result<(), ApiError> {
        self.call(Endpoint::DeleteAlarm(id))
    }

    pub fn toggle_alarm(&self, id: i64) -> Result<Alarm, ApiError> {
        self.call(Endpoint::ToggleAlarm(id))
    }

    /// Record that the alarm fired; returns the new log entry.
    pub fn record_trigger(&self, id: i64) -> Result<AlarmLog, ApiError> {
        self.call(Endpoint::RecordTrigger(id))
    }

    pub fn snooze(&self, id: i64) -> Result<SnoozeSettings, ApiError> {
        self.call(Endpoint::GetSnooze(id))
    }

    pub fn update_snooze(
        &self,
        id: i64,
        settings: SnoozeSettings,
    ) -> Result<SnoozeSettings, ApiError> {
        self.call(Endpoint::UpdateSnooze(id, settings))
    }

    pub fn toggle_snooze(&self, id: i64) -> Result<SnoozeSettings, ApiError> {
        self.call(Endpoint::ToggleSnooze(id))
    }

    pub fn repeat_days(&self, id: i64) -> Result<RepeatDays, ApiError> {
        self.call(Endpoint::GetRepeatDays(id))
    }

    pub fn update_repeat_days(&self, id: i64, days: RepeatDays) -> Result<RepeatDays, ApiError> {
        self.call(Endpoint::UpdateRepeatDays(id, days))
    }

    pub fn mission(&self, id: i64) -> Result<MissionSettings, ApiError> {
        self.call(Endpoint::GetMission(id))
    }

    pub fn update_mission(
        &self,
        id: i64,
        mission: MissionSettings,
    ) -> Result<MissionSettings, ApiError> {
        self.call(Endpoint::UpdateMission(id, mission))
    }

    pub fn start_mission(&self, id: i64) -> Result<MissionSession, ApiError> {
        self.call(Endpoint::StartMission(id))
    }

    pub fn walk(&self, id: i64, walk: WalkDistance) -> Result<WalkProgress, ApiError> {
        self.call(Endpoint::WalkMission(id, walk))
    }

    pub fn submit_mission(
        &self,
        id: i64,
        submission: MissionSubmission,
    ) -> Result<MissionResult, ApiError> {
        self.call(Endpoint::SubmitMission(id, submission))
    }

    pub fn alarm_logs(&self, id: i64) -> Result<Vec<AlarmLog>, ApiError> {
        self.call(Endpoint::AlarmLogs(id))
    }

    pub fn my_alarm_history(&self) -> Result<Vec<AlarmLog>, ApiError> {
        self.call(Endpoint::MyAlarmHistory)
    }

    pub fn alarm_sounds(&self) -> Result<Vec<AlarmSound>, ApiError> {
        self.call(Endpoint::AlarmSounds)
    }

    // -----------------------------------------------------------------------
    // Todos and home
    // -----------------------------------------------------------------------

    pub fn todos(&self, event_date: &str) -> Result<Vec<Todo>, ApiError> {
        self.call_enveloped(Endpoint::ListTodos {
            event_date: event_date.to_string(),
        })
    }

    pub fn create_todo(&self, input: TodoInput) -> Result<Todo, ApiError> {
        self.call_enveloped(Endpoint::CreateTodo(input))
    }

    pub fn update_todo(&self, id: i64, input: TodoInput) -> Result<Todo, ApiError> {
        self.call_enveloped(Endpoint::UpdateTodo(id, input))
    }

    pub fn delete_todo(&self, id: i64) -> Result<(), ApiError> {
        self.call_acknowledged(Endpoint::DeleteTodo(id))
    }

    pub fn todo_briefing(&self, id: i64) -> Result<TodoBriefing, ApiError> {
        self.call_enveloped(Endpoint::TodoBriefing(id))
    }

    pub fn home(&self, today: &str) -> Result<HomeInfo, ApiError> {
        self.call_enveloped(Endpoint::Home {
            today: today.to_string(),
        })
    }
}
