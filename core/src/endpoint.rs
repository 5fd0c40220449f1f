//! Endpoint descriptors for every Lumo API call.
//!
//! # Design
//! An `Endpoint` is an immutable value naming one call: its method, its
//! path with ids substituted, and its parameters. `ApiClient::build` is the
//! only consumer; it turns `Params` into a query string or a JSON body.
//! Typed payloads stay in the variants until `params()` is asked for, so a
//! serialization failure surfaces as an `ApiError` at build time.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{
    AlarmInput, MissionDifficulty, MissionDurationUpdate, MissionLevelUpdate, MissionSettings,
    MissionSubmission, RepeatDays, SmartBriefingUpdate, SnoozeSettings, Theme, ThemeUpdate,
    TodoInput, VoiceUpdate, WalkDistance,
};

/// One API call described as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    // alarms
    ListAlarms,
    GetAlarm(i64),
    CreateAlarm(AlarmInput),
    UpdateAlarm(i64, AlarmInput),
    DeleteAlarm(i64),
    ToggleAlarm(i64),
    RecordTrigger(i64),
    GetSnooze(i64),
    UpdateSnooze(i64, SnoozeSettings),
    ToggleSnooze(i64),
    GetRepeatDays(i64),
    UpdateRepeatDays(i64, RepeatDays),
    GetMission(i64),
    UpdateMission(i64, MissionSettings),
    StartMission(i64),
    WalkMission(i64, WalkDistance),
    SubmitMission(i64, MissionSubmission),
    AlarmLogs(i64),
    MyAlarmHistory,
    AlarmSounds,

    // todos
    ListTodos { event_date: String },
    CreateTodo(TodoInput),
    UpdateTodo(i64, TodoInput),
    DeleteTodo(i64),
    TodoBriefing(i64),

    // home
    Home { today: String },

    // member settings
    UpdateTheme(Theme),
    UpdateVoice(String),
    UpdateMissionLevel(MissionDifficulty),
    UpdateMissionDuration(u32),
    UpdateSmartBriefing(bool),
}

/// Parameters of an endpoint, already in wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    None,
    Query(Vec<(&'static str, String)>),
    Json(Value),
}

impl Endpoint {
    pub fn method(&self) -> HttpMethod {
        use Endpoint::*;
        match self {
            ListAlarms | GetAlarm(_) | GetSnooze(_) | GetRepeatDays(_) | GetMission(_)
            | AlarmLogs(_) | MyAlarmHistory | AlarmSounds | ListTodos { .. }
            | TodoBriefing(_) | Home { .. } => HttpMethod::Get,
            CreateAlarm(_) | RecordTrigger(_) | StartMission(_) | WalkMission(..)
            | SubmitMission(..) | CreateTodo(_) => HttpMethod::Post,
            UpdateAlarm(..) | UpdateSnooze(..) | UpdateRepeatDays(..) | UpdateMission(..) => {
                HttpMethod::Put
            }
            ToggleAlarm(_) | ToggleSnooze(_) | UpdateTodo(..) | UpdateTheme(_)
            | UpdateVoice(_) | UpdateMissionLevel(_) | UpdateMissionDuration(_)
            | UpdateSmartBriefing(_) => HttpMethod::Patch,
            DeleteAlarm(_) | DeleteTodo(_) => HttpMethod::Delete,
        }
    }

    /// Path relative to the API base URL, always starting with `/api`.
    pub fn path(&self) -> String {
        use Endpoint::*;
        match self {
            ListAlarms | CreateAlarm(_) => "/api/alarms".to_string(),
            GetAlarm(id) | UpdateAlarm(id, _) | DeleteAlarm(id) => format!("/api/alarms/{id}"),
            ToggleAlarm(id) => format!("/api/alarms/{id}/toggle"),
            RecordTrigger(id) => format!("/api/alarms/{id}/trigger"),
            GetSnooze(id) | UpdateSnooze(id, _) => format!("/api/alarms/{id}/snooze"),
            ToggleSnooze(id) => format!("/api/alarms/{id}/snooze/toggle"),
            GetRepeatDays(id) | UpdateRepeatDays(id, _) => format!("/api/alarms/{id}/repeat-days"),
            GetMission(id) | UpdateMission(id, _) => format!("/api/alarms/{id}/mission"),
            StartMission(id) => format!("/api/alarms/{id}/missions/start"),
            WalkMission(id, _) => format!("/api/alarms/{id}/missions/walk"),
            SubmitMission(id, _) => format!("/api/alarms/{id}/missions/submit"),
            AlarmLogs(id) => format!("/api/alarms/{id}/logs"),
            MyAlarmHistory => "/api/alarms/members/me/alarm-logs".to_string(),
            AlarmSounds => "/api/alarms/sounds".to_string(),
            ListTodos { .. } | CreateTodo(_) => "/api/to-do".to_string(),
            UpdateTodo(id, _) | DeleteTodo(id) => format!("/api/to-do/{id}"),
            TodoBriefing(id) => format!("/api/to-do/briefing/{id}"),
            Home { .. } => "/api/home".to_string(),
            UpdateTheme(_) => "/api/members/me/theme".to_string(),
            UpdateVoice(_) => "/api/members/me/voice".to_string(),
            UpdateMissionLevel(_) => "/api/members/me/mission-level".to_string(),
            UpdateMissionDuration(_) => "/api/members/me/mission-duration".to_string(),
            UpdateSmartBriefing(_) => "/api/members/me/smart-briefing".to_string(),
        }
    }

    pub fn params(&self) -> Result<Params, ApiError> {
        use Endpoint::*;
        let params = match self {
            ListTodos { event_date } => Params::Query(vec![("eventDate", event_date.clone())]),
            Home { today } => Params::Query(vec![("today", today.clone())]),

            CreateAlarm(input) | UpdateAlarm(_, input) => json(input)?,
            UpdateSnooze(_, snooze) => json(snooze)?,
            UpdateRepeatDays(_, days) => json(days)?,
            UpdateMission(_, mission) => json(mission)?,
            WalkMission(_, walk) => json(walk)?,
            SubmitMission(_, submission) => json(submission)?,
            CreateTodo(input) | UpdateTodo(_, input) => json(input)?,

            UpdateTheme(theme) => json(&ThemeUpdate { theme: *theme })?,
            UpdateVoice(voice_id) => json(&VoiceUpdate {
                voice_id: voice_id.clone(),
            })?,
            UpdateMissionLevel(level) => json(&MissionLevelUpdate {
                mission_level: *level,
            })?,
            UpdateMissionDuration(seconds) => json(&MissionDurationUpdate {
                mission_duration: *seconds,
            })?,
            UpdateSmartBriefing(enabled) => json(&SmartBriefingUpdate {
                is_smart_briefing: *enabled,
            })?,

            ListAlarms | GetAlarm(_) | DeleteAlarm(_) | ToggleAlarm(_) | RecordTrigger(_)
            | GetSnooze(_) | ToggleSnooze(_) | GetRepeatDays(_) | GetMission(_)
            | StartMission(_) | AlarmLogs(_) | MyAlarmHistory | AlarmSounds | DeleteTodo(_)
            | TodoBriefing(_) => Params::None,
        };
        Ok(params)
    }

    /// Short label for log lines.
    pub fn name(&self) -> &'static str {
        use Endpoint::*;
        match self {
            ListAlarms => "list_alarms",
            GetAlarm(_) => "get_alarm",
            CreateAlarm(_) => "create_alarm",
            UpdateAlarm(..) => "update_alarm",
            DeleteAlarm(_) => "delete_alarm",
            ToggleAlarm(_) => "toggle_alarm",
            RecordTrigger(_) => "record_trigger",
            GetSnooze(_) => "get_snooze",
            UpdateSnooze(..) => "update_snooze",
            ToggleSnooze(_) => "toggle_snooze",
            GetRepeatDays(_) => "get_repeat_days",
            UpdateRepeatDays(..) => "update_repeat_days",
            GetMission(_) => "get_mission",
            UpdateMission(..) => "update_mission",
            StartMission(_) => "start_mission",
            WalkMission(..) => "walk_mission",
            SubmitMission(..) => "submit_mission",
            AlarmLogs(_) => "alarm_logs",
            MyAlarmHistory => "my_alarm_history",
            AlarmSounds => "alarm_sounds",
            ListTodos { .. } => "list_todos",
            CreateTodo(_) => "create_todo",
            UpdateTodo(..) => "update_todo",
            DeleteTodo(_) => "delete_todo",
            TodoBriefing(_) => "todo_briefing",
            Home { .. } => "home",
            UpdateTheme(_) => "update_theme",
            UpdateVoice(_) => "update_voice",
            UpdateMissionLevel(_) => "update_mission_level",
            UpdateMissionDuration(_) => "update_mission_duration",
            UpdateSmartBriefing(_) => "update_smart_briefing",
        }
    }
}

fn json<T: Serialize>(payload: &T) -> Result<Params, ApiError> {
    serde_json::to_value(payload)
        .map(Params::Json)
        .map_err(|e| ApiError::Serialization(e.to_string()))
}
