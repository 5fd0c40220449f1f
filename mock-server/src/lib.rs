use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: i64,
    pub label: String,
    pub alarm_time: String,
    pub is_enabled: bool,
    pub repeat_days: Vec<String>,
    pub sound_id: Option<i64>,
    pub volume: u8,
    pub vibration: bool,
    pub is_snooze_enabled: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmInput {
    pub label: String,
    pub alarm_time: String,
    #[serde(default)]
    pub repeat_days: Vec<String>,
    pub sound_id: Option<i64>,
    pub volume: u8,
    pub vibration: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snooze {
    pub is_enabled: bool,
    pub interval_minutes: u32,
    pub max_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatDays {
    pub repeat_days: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub mission_type: String,
    pub difficulty: String,
    pub count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSession {
    pub alarm_log_id: i64,
    pub mission_type: String,
    pub difficulty: String,
    pub questions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Walk {
    pub alarm_log_id: i64,
    pub distance_meters: f64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkProgress {
    pub walked_meters: f64,
    pub goal_meters: f64,
    pub is_completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub alarm_log_id: i64,
    pub answers: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionResult {
    pub is_completed: bool,
    pub correct_count: u32,
    pub total_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmLog {
    pub id: i64,
    pub alarm_id: i64,
    pub triggered_at: String,
    pub dismissed_at: Option<String>,
    pub snooze_count: u32,
    pub is_mission_completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sound {
    pub id: i64,
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub event_date: String,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInput {
    pub event_date: String,
    pub content: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoBriefing {
    pub todo_id: i64,
    pub briefing: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeInfo {
    pub today: String,
    pub next_alarm: Option<Alarm>,
    pub todos: Vec<Todo>,
}

/// Response wrapper for todo, home and member-settings routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    pub message: String,
    pub success: bool,
    pub result: Option<T>,
}

fn envelope<T>(message: &str, result: Option<T>) -> Json<Envelope<T>> {
    Json(Envelope {
        code: "OK".to_string(),
        message: message.to_string(),
        success: true,
        result,
    })
}

/// Enveloped error: `success: false` with a non-2xx status.
pub struct Failure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            code: self.code.to_string(),
            message: self.message,
            success: false,
            result: None,
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Backend {
    next_id: i64,
    alarms: BTreeMap<i64, Alarm>,
    snooze: HashMap<i64, Snooze>,
    missions: HashMap<i64, Mission>,
    logs: BTreeMap<i64, AlarmLog>,
    expected_answers: HashMap<i64, Vec<String>>,
    walked: HashMap<i64, f64>,
    todos: BTreeMap<i64, Todo>,
    settings: serde_json::Map<String, Value>,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Db = Arc<RwLock<Backend>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::default()));
    Router::new()
        .route("/api/alarms", get(list_alarms).post(create_alarm))
        .route("/api/alarms/sounds", get(list_sounds))
        .route("/api/alarms/members/me/alarm-logs", get(my_alarm_logs))
        .route(
            "/api/alarms/{id}",
            get(get_alarm).put(update_alarm).delete(delete_alarm),
        )
        .route("/api/alarms/{id}/toggle", patch(toggle_alarm))
        .route("/api/alarms/{id}/trigger", post(record_trigger))
        .route("/api/alarms/{id}/snooze", get(get_snooze).put(put_snooze))
        .route("/api/alarms/{id}/snooze/toggle", patch(toggle_snooze))
        .route(
            "/api/alarms/{id}/repeat-days",
            get(get_repeat_days).put(put_repeat_days),
        )
        .route("/api/alarms/{id}/mission", get(get_mission).put(put_mission))
        .route("/api/alarms/{id}/missions/start", post(start_mission))
        .route("/api/alarms/{id}/missions/walk", post(walk_mission))
        .route("/api/alarms/{id}/missions/submit", post(submit_mission))
        .route("/api/alarms/{id}/logs", get(alarm_logs))
        .route("/api/to-do", get(list_todos).post(create_todo))
        .route("/api/to-do/{id}", patch(update_todo).delete(delete_todo))
        .route("/api/to-do/briefing/{id}", get(todo_briefing))
        .route("/api/home", get(home))
        .route("/api/members/me/settings", get(member_settings))
        .route("/api/members/me/{setting}", patch(update_setting))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

fn now() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    secs.to_string()
}

// ---------------------------------------------------------------------------
// Alarms
// ---------------------------------------------------------------------------

async fn list_alarms(State(db): State<Db>) -> Json<Vec<Alarm>> {
    let db = db.read().await;
    Json(db.alarms.values().cloned().collect())
}

async fn create_alarm(
    State(db): State<Db>,
    Json(input): Json<AlarmInput>,
) -> (StatusCode, Json<Alarm>) {
    let mut db = db.write().await;
    let alarm = Alarm {
        id: db.next_id(),
        label: input.label,
        alarm_time: input.alarm_time,
        is_enabled: true,
        repeat_days: input.repeat_days,
        sound_id: input.sound_id,
        volume: input.volume,
        vibration: input.vibration,
        is_snooze_enabled: false,
    };
    db.alarms.insert(alarm.id, alarm.clone());
    debug!(id = alarm.id, "alarm created");
    (StatusCode::CREATED, Json(alarm))
}

async fn get_alarm(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Alarm>, StatusCode> {
    let db = db.read().await;
    db.alarms.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_alarm(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<AlarmInput>,
) -> Result<Json<Alarm>, StatusCode> {
    let mut db = db.write().await;
    let alarm = db.alarms.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    alarm.label = input.label;
    alarm.alarm_time = input.alarm_time;
    alarm.repeat_days = input.repeat_days;
    alarm.sound_id = input.sound_id;
    alarm.volume = input.volume;
    alarm.vibration = input.vibration;
    Ok(Json(alarm.clone()))
}

async fn delete_alarm(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut db = db.write().await;
    db.alarms.remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    db.snooze.remove(&id);
    db.missions.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_alarm(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Alarm>, StatusCode> {
    let mut db = db.write().await;
    let alarm = db.alarms.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    alarm.is_enabled = !alarm.is_enabled;
    Ok(Json(alarm.clone()))
}

async fn record_trigger(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<AlarmLog>), StatusCode> {
    let mut db = db.write().await;
    if !db.alarms.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let log = AlarmLog {
        id: db.next_id(),
        alarm_id: id,
        triggered_at: now(),
        dismissed_at: None,
        snooze_count: 0,
        is_mission_completed: false,
    };
    db.logs.insert(log.id, log.clone());
    Ok((StatusCode::CREATED, Json(log)))
}

fn default_snooze() -> Snooze {
    Snooze {
        is_enabled: false,
        interval_minutes: 5,
        max_count: 3,
    }
}

async fn get_snooze(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Snooze>, StatusCode> {
    let db = db.read().await;
    if !db.alarms.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(db.snooze.get(&id).cloned().unwrap_or_else(default_snooze)))
}

async fn put_snooze(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<Snooze>,
) -> Result<Json<Snooze>, StatusCode> {
    let mut db = db.write().await;
    let alarm = db.alarms.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    alarm.is_snooze_enabled = input.is_enabled;
    db.snooze.insert(id, input.clone());
    Ok(Json(input))
}

async fn toggle_snooze(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Snooze>, StatusCode> {
    let mut db = db.write().await;
    let alarm = db.alarms.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    alarm.is_snooze_enabled = !alarm.is_snooze_enabled;
    let enabled = alarm.is_snooze_enabled;
    let snooze = db.snooze.entry(id).or_insert_with(default_snooze);
    snooze.is_enabled = enabled;
    Ok(Json(snooze.clone()))
}

async fn get_repeat_days(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<RepeatDays>, StatusCode> {
    let db = db.read().await;
    let alarm = db.alarms.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(RepeatDays {
        repeat_days: alarm.repeat_days.clone(),
    }))
}

async fn put_repeat_days(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<RepeatDays>,
) -> Result<Json<RepeatDays>, StatusCode> {
    let mut db = db.write().await;
    let alarm = db.alarms.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    alarm.repeat_days = input.repeat_days.clone();
    Ok(Json(input))
}

fn default_mission() -> Mission {
    Mission {
        mission_type: "NONE".to_string(),
        difficulty: "MEDIUM".to_string(),
        count: 0,
    }
}

async fn get_mission(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Mission>, StatusCode> {
    let db = db.read().await;
    if !db.alarms.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(db.missions.get(&id).cloned().unwrap_or_else(default_mission)))
}

async fn put_mission(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<Mission>,
) -> Result<Json<Mission>, StatusCode> {
    let mut db = db.write().await;
    if !db.alarms.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    db.missions.insert(id, input.clone());
    Ok(Json(input))
}

/// Math questions are `a + b`; the expected answer is kept per log.
async fn start_mission(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<MissionSession>), StatusCode> {
    let mut db = db.write().await;
    if !db.alarms.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let mission = db.missions.get(&id).cloned().unwrap_or_else(default_mission);
    let log_id = db.next_id();
    db.logs.insert(
        log_id,
        AlarmLog {
            id: log_id,
            alarm_id: id,
            triggered_at: now(),
            dismissed_at: None,
            snooze_count: 0,
            is_mission_completed: false,
        },
    );

    let mut questions = Vec::new();
    let mut answers = Vec::new();
    if mission.mission_type == "MATH" {
        for i in 0..mission.count as i64 {
            let (a, b) = (log_id + i, i * 3 + 1);
            questions.push(format!("{a} + {b}"));
            answers.push((a + b).to_string());
        }
    }
    db.expected_answers.insert(log_id, answers);

    Ok((
        StatusCode::CREATED,
        Json(MissionSession {
            alarm_log_id: log_id,
            mission_type: mission.mission_type,
            difficulty: mission.difficulty,
            questions,
        }),
    ))
}

fn complete_log(db: &mut Backend, log_id: i64) {
    let now = now();
    if let Some(log) = db.logs.get_mut(&log_id) {
        log.is_mission_completed = true;
        log.dismissed_at = Some(now);
    }
}

/// 404 unless `log_id` was recorded for `alarm_id`.
fn require_log_of(db: &Backend, log_id: i64, alarm_id: i64) -> Result<(), StatusCode> {
    match db.logs.get(&log_id) {
        Some(log) if log.alarm_id == alarm_id => Ok(()),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn walk_mission(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<Walk>,
) -> Result<Json<WalkProgress>, StatusCode> {
    let mut db = db.write().await;
    let goal = db
        .missions
        .get(&id)
        .filter(|m| m.mission_type == "DISTANCE")
        .map(|m| f64::from(m.count))
        .ok_or(StatusCode::NOT_FOUND)?;
    require_log_of(&db, input.alarm_log_id, id)?;
    let walked = db.walked.entry(input.alarm_log_id).or_insert(0.0);
    *walked += input.distance_meters;
    let walked = *walked;
    let is_completed = walked >= goal;
    if is_completed {
        complete_log(&mut db, input.alarm_log_id);
    }
    Ok(Json(WalkProgress {
        walked_meters: walked,
        goal_meters: goal,
        is_completed,
    }))
}

async fn submit_mission(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<Submission>,
) -> Result<Json<MissionResult>, StatusCode> {
    let mut db = db.write().await;
    require_log_of(&db, input.alarm_log_id, id)?;
    let expected = db
        .expected_answers
        .get(&input.alarm_log_id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;
    let correct_count = expected
        .iter()
        .zip(&input.answers)
        .filter(|(want, got)| want.as_str() == got.trim())
        .count() as u32;
    let total_count = expected.len() as u32;
    let is_completed = correct_count == total_count;
    if is_completed {
        complete_log(&mut db, input.alarm_log_id);
    }
    Ok(Json(MissionResult {
        is_completed,
        correct_count,
        total_count,
    }))
}

async fn alarm_logs(State(db): State<Db>, Path(id): Path<i64>) -> Json<Vec<AlarmLog>> {
    let db = db.read().await;
    Json(db.logs.values().filter(|l| l.alarm_id == id).cloned().collect())
}

async fn my_alarm_logs(State(db): State<Db>) -> Json<Vec<AlarmLog>> {
    let db = db.read().await;
    Json(db.logs.values().cloned().collect())
}

async fn list_sounds() -> Json<Vec<Sound>> {
    let sounds = ["Sunrise", "Birdsong", "Klaxon"]
        .iter()
        .zip(1..)
        .map(|(name, id)| Sound {
            id,
            name: name.to_string(),
            url: format!("https://cdn.lumo.example/sounds/{}.caf", name.to_lowercase()),
        })
        .collect();
    Json(sounds)
}

// ---------------------------------------------------------------------------
// Todos and home
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoQuery {
    pub event_date: String,
}

#[derive(Deserialize)]
pub struct HomeQuery {
    pub today: String,
}

async fn list_todos(
    State(db): State<Db>,
    Query(query): Query<TodoQuery>,
) -> Json<Envelope<Vec<Todo>>> {
    let db = db.read().await;
    let todos = db
        .todos
        .values()
        .filter(|t| t.event_date == query.event_date)
        .cloned()
        .collect();
    envelope("ok", Some(todos))
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<TodoInput>,
) -> Result<(StatusCode, Json<Envelope<Todo>>), Failure> {
    if input.content.trim().is_empty() {
        return Err(Failure::new(
            StatusCode::BAD_REQUEST,
            "TODO_400",
            "content must not be empty",
        ));
    }
    let mut db = db.write().await;
    let todo = Todo {
        id: db.next_id(),
        event_date: input.event_date,
        content: input.content,
    };
    db.todos.insert(todo.id, todo.clone());
    Ok((StatusCode::CREATED, envelope("created", Some(todo))))
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<TodoInput>,
) -> Result<Json<Envelope<Todo>>, Failure> {
    let mut db = db.write().await;
    let todo = db
        .todos
        .get_mut(&id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "TODO_404", "no such todo"))?;
    todo.event_date = input.event_date;
    todo.content = input.content;
    Ok(envelope("updated", Some(todo.clone())))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, Failure> {
    let mut db = db.write().await;
    db.todos
        .remove(&id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "TODO_404", "no such todo"))?;
    Ok(envelope("deleted", None))
}

async fn todo_briefing(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<TodoBriefing>>, Failure> {
    let db = db.read().await;
    let todo = db
        .todos
        .get(&id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "TODO_404", "no such todo"))?;
    let briefing = TodoBriefing {
        todo_id: id,
        briefing: format!("On {} you planned to {}.", todo.event_date, todo.content),
    };
    Ok(envelope("ok", Some(briefing)))
}

async fn home(State(db): State<Db>, Query(query): Query<HomeQuery>) -> Json<Envelope<HomeInfo>> {
    let db = db.read().await;
    let next_alarm = db
        .alarms
        .values()
        .filter(|a| a.is_enabled)
        .min_by(|a, b| a.alarm_time.cmp(&b.alarm_time))
        .cloned();
    let todos = db
        .todos
        .values()
        .filter(|t| t.event_date == query.today)
        .cloned()
        .collect();
    envelope(
        "ok",
        Some(HomeInfo {
            today: query.today,
            next_alarm,
            todos,
        }),
    )
}

// ---------------------------------------------------------------------------
// Member settings
// ---------------------------------------------------------------------------

fn require_session(headers: &HeaderMap) -> Result<(), Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    if token.is_empty() {
        return Err(Failure::new(
            StatusCode::UNAUTHORIZED,
            "MEMBER_401",
            "session required",
        ));
    }
    Ok(())
}

/// Wire field expected in the body of each settings route.
fn setting_field(setting: &str) -> Option<&'static str> {
    match setting {
        "theme" => Some("theme"),
        "voice" => Some("voiceId"),
        "mission-level" => Some("missionLevel"),
        "mission-duration" => Some("missionDuration"),
        "smart-briefing" => Some("isSmartBriefing"),
        _ => None,
    }
}

fn valid_setting(field: &str, value: &Value) -> bool {
    match field {
        "theme" => matches!(value.as_str(), Some("LIGHT" | "DARK" | "SYSTEM")),
        "voiceId" => value.as_str().is_some_and(|v| !v.is_empty()),
        "missionLevel" => matches!(value.as_str(), Some("LOW" | "MEDIUM" | "HIGH")),
        "missionDuration" => value.as_u64().is_some_and(|v| v > 0),
        "isSmartBriefing" => value.is_boolean(),
        _ => false,
    }
}

async fn update_setting(
    State(db): State<Db>,
    Path(setting): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Envelope<()>>, Failure> {
    require_session(&headers)?;
    let field = setting_field(&setting)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "MEMBER_404", "unknown setting"))?;
    let value = body.get(field).cloned().unwrap_or(Value::Null);
    if !valid_setting(field, &value) {
        return Err(Failure::new(
            StatusCode::BAD_REQUEST,
            "MEMBER_400",
            format!("invalid {field}"),
        ));
    }
    debug!(field, %value, "setting updated");
    db.write().await.settings.insert(field.to_string(), value);
    Ok(envelope("updated", None))
}

async fn member_settings(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Value>>, Failure> {
    require_session(&headers)?;
    let db = db.read().await;
    Ok(envelope("ok", Some(Value::Object(db.settings.clone()))))
}
