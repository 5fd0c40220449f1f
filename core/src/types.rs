//! Domain DTOs for the Lumo API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined
//! independently; integration tests catch drift between the two crates.
//! Field names go over the wire in camelCase, enum tags in
//! SCREAMING_SNAKE_CASE.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Response wrapper used by the todo, home and settings endpoints.
///
/// A 2xx status alone does not mean success; `success` must be checked too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub code: String,
    pub message: String,
    pub success: bool,
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap `result`, failing on `success: false` or a null result.
    pub fn into_result(self) -> Result<T, ApiError> {
        self.acknowledge()?.ok_or(ApiError::MissingResult)
    }

    /// Check `success` only; `result` may be absent.
    pub fn acknowledge(self) -> Result<Option<T>, ApiError> {
        if self.success {
            Ok(self.result)
        } else {
            Err(ApiError::Rejected {
                code: self.code,
                message: self.message,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Alarms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

/// A configured wake-up alarm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: i64,
    pub label: String,
    /// Local wall-clock time, `HH:MM`.
    pub alarm_time: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub repeat_days: Vec<Weekday>,
    pub sound_id: Option<i64>,
    pub volume: u8,
    pub vibration: bool,
    #[serde(default)]
    pub is_snooze_enabled: bool,
}

/// Payload for creating or replacing an alarm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlarmInput {
    pub label: String,
    pub alarm_time: String,
    #[serde(default)]
    pub repeat_days: Vec<Weekday>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_id: Option<i64>,
    pub volume: u8,
    pub vibration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnoozeSettings {
    pub is_enabled: bool,
    pub interval_minutes: u32,
    pub max_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepeatDays {
    pub repeat_days: Vec<Weekday>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionType {
    None,
    Math,
    Typing,
    Distance,
    Ox,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionDifficulty {
    Low,
    #[default]
    Medium,
    High,
}

impl MissionDifficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionDifficulty::Low => "LOW",
            MissionDifficulty::Medium => "MEDIUM",
            MissionDifficulty::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(MissionDifficulty::Low),
            "MEDIUM" => Some(MissionDifficulty::Medium),
            "HIGH" => Some(MissionDifficulty::High),
            _ => None,
        }
    }
}

/// The challenge that must be completed to dismiss an alarm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissionSettings {
    pub mission_type: MissionType,
    pub difficulty: MissionDifficulty,
    /// Number of problems, or metres for `Distance`.
    pub count: u32,
}

/// Returned when an alarm fires and its mission starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MissionSession {
    pub alarm_log_id: i64,
    pub mission_type: MissionType,
    pub difficulty: MissionDifficulty,
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalkDistance {
    pub alarm_log_id: i64,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalkProgress {
    pub walked_meters: f64,
    pub goal_meters: f64,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissionSubmission {
    pub alarm_log_id: i64,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissionResult {
    pub is_completed: bool,
    pub correct_count: u32,
    pub total_count: u32,
}

/// One firing of an alarm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlarmLog {
    pub id: i64,
    pub alarm_id: i64,
    pub triggered_at: String,
    pub dismissed_at: Option<String>,
    #[serde(default)]
    pub snooze_count: u32,
    #[serde(default)]
    pub is_mission_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSound {
    pub id: i64,
    pub name: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Todos and home
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    /// `YYYY-MM-DD`.
    pub event_date: String,
    pub content: String,
}

/// Payload for creating or updating a todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoInput {
    pub event_date: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoBriefing {
    pub todo_id: i64,
    pub briefing: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeInfo {
    pub today: String,
    pub next_alarm: Option<Alarm>,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

// ---------------------------------------------------------------------------
// Member settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "LIGHT",
            Theme::Dark => "DARK",
            Theme::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LIGHT" => Some(Theme::Light),
            "DARK" => Some(Theme::Dark),
            "SYSTEM" => Some(Theme::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeUpdate {
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceUpdate {
    pub voice_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissionLevelUpdate {
    pub mission_level: MissionDifficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissionDurationUpdate {
    /// Seconds allowed to finish a mission.
    pub mission_duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SmartBriefingUpdate {
    #[serde(rename = "isSmartBriefing")]
    pub is_smart_briefing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_into_result_unwraps_success() {
        let env: Envelope<Todo> = serde_json::from_str(
            r#"{"code":"OK","message":"created","success":true,
                "result":{"id":1,"eventDate":"2026-02-20","content":"buy milk"}}"#,
        )
        .unwrap();
        let todo = env.into_result().unwrap();
        assert_eq!(todo.event_date, "2026-02-20");
    }

    #[test]
    fn envelope_rejects_when_success_is_false() {
        let env: Envelope<Todo> = serde_json::from_str(
            r#"{"code":"TODO_404","message":"missing","success":false,"result":null}"#,
        )
        .unwrap();
        let err = env.into_result().unwrap_err();
        assert!(matches!(err, ApiError::Rejected { ref code, .. } if code == "TODO_404"));
    }

    #[test]
    fn envelope_without_result_field_is_missing_result() {
        let env: Envelope<Todo> =
            serde_json::from_str(r#"{"code":"OK","message":"deleted","success":true}"#).unwrap();
        assert!(env.clone().acknowledge().unwrap().is_none());
        assert!(matches!(env.into_result(), Err(ApiError::MissingResult)));
    }

    #[test]
    fn alarm_uses_camel_case_and_upper_weekdays() {
        let alarm = Alarm {
            id: 42,
            label: "Gym".into(),
            alarm_time: "06:30".into(),
            is_enabled: true,
            repeat_days: vec![Weekday::Mon, Weekday::Fri],
            sound_id: None,
            volume: 80,
            vibration: false,
            is_snooze_enabled: true,
        };
        let json = serde_json::to_value(&alarm).unwrap();
        assert_eq!(json["alarmTime"], "06:30");
        assert_eq!(json["isEnabled"], true);
        assert_eq!(json["repeatDays"], serde_json::json!(["MON", "FRI"]));
        assert_eq!(json["isSnoozeEnabled"], true);
    }

    #[test]
    fn mission_difficulty_string_forms_match_serde() {
        for level in [
            MissionDifficulty::Low,
            MissionDifficulty::Medium,
            MissionDifficulty::High,
        ] {
            let json = serde_json::to_value(level).unwrap();
            assert_eq!(json, level.as_str());
            assert_eq!(MissionDifficulty::parse(level.as_str()), Some(level));
        }
        assert_eq!(MissionDifficulty::parse("EXTREME"), None);
    }

    #[test]
    fn smart_briefing_update_keeps_wire_name() {
        let json = serde_json::to_string(&SmartBriefingUpdate {
            is_smart_briefing: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"isSmartBriefing":true}"#);
    }
}
