use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Alarm, AlarmLog, Envelope, HomeInfo, MissionResult, MissionSession, Todo};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn authed(method: &str, uri: &str, body: &str) -> Request<String> {
    let mut req = json_request(method, uri, body);
    req.headers_mut().insert(
        http::header::AUTHORIZATION,
        http::HeaderValue::from_static("Bearer test-token"),
    );
    req
}

const WAKE: &str = r#"{"label":"Wake","alarmTime":"07:00","repeatDays":["MON","FRI"],
    "soundId":1,"volume":80,"vibration":true}"#;

async fn seed_alarm(app: &Router) -> Alarm {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/alarms", WAKE))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- alarms ---

#[tokio::test]
async fn list_alarms_empty() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/alarms"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let alarms: Vec<Alarm> = body_json(resp).await;
    assert!(alarms.is_empty());
}

#[tokio::test]
async fn create_alarm_returns_201_bare() {
    let app = app();
    let alarm = seed_alarm(&app).await;

    assert_eq!(alarm.label, "Wake");
    assert!(alarm.is_enabled);
    assert!(!alarm.is_snooze_enabled);
    assert_eq!(alarm.repeat_days, vec!["MON", "FRI"]);
}

#[tokio::test]
async fn create_alarm_missing_field_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/alarms", r#"{"label":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn toggle_alarm_flips_enabled() {
    let app = app();
    let alarm = seed_alarm(&app).await;

    let uri = format!("/api/alarms/{}/toggle", alarm.id);
    let resp = app
        .clone()
        .oneshot(empty_request("PATCH", &uri))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let toggled: Alarm = body_json(resp).await;
    assert!(!toggled.is_enabled);
}

#[tokio::test]
async fn get_missing_alarm_returns_404() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/alarms/999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_alarm_returns_204_then_404() {
    let app = app();
    let alarm = seed_alarm(&app).await;
    let uri = format!("/api/alarms/{}", alarm.id);

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sounds_route_is_not_shadowed_by_id() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/alarms/sounds"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let sounds: Vec<Value> = body_json(resp).await;
    assert_eq!(sounds.len(), 3);
}

#[tokio::test]
async fn snooze_toggle_mirrors_alarm_flag() {
    let app = app();
    let alarm = seed_alarm(&app).await;

    let uri = format!("/api/alarms/{}/snooze/toggle", alarm.id);
    let resp = app
        .clone()
        .oneshot(empty_request("PATCH", &uri))
        .await
        .unwrap();
    let snooze: Value = body_json(resp).await;
    assert_eq!(snooze["isEnabled"], true);
    assert_eq!(snooze["intervalMinutes"], 5);

    let uri = format!("/api/alarms/{}", alarm.id);
    let resp = app.oneshot(empty_request("GET", &uri)).await.unwrap();
    let alarm: Alarm = body_json(resp).await;
    assert!(alarm.is_snooze_enabled);
}

#[tokio::test]
async fn trigger_records_log() {
    let app = app();
    let alarm = seed_alarm(&app).await;

    let uri = format!("/api/alarms/{}/trigger", alarm.id);
    let resp = app
        .clone()
        .oneshot(empty_request("POST", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let log: AlarmLog = body_json(resp).await;
    assert_eq!(log.alarm_id, alarm.id);

    let resp = app
        .oneshot(empty_request("GET", "/api/alarms/members/me/alarm-logs"))
        .await
        .unwrap();
    let logs: Vec<AlarmLog> = body_json(resp).await;
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn math_mission_round() {
    let app = app();
    let alarm = seed_alarm(&app).await;

    let uri = format!("/api/alarms/{}/mission", alarm.id);
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            r#"{"missionType":"MATH","difficulty":"LOW","count":2}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let uri = format!("/api/alarms/{}/missions/start", alarm.id);
    let resp = app
        .clone()
        .oneshot(empty_request("POST", &uri))
        .await
        .unwrap();
    let session: MissionSession = body_json(resp).await;
    assert_eq!(session.questions.len(), 2);

    let answers: Vec<String> = session
        .questions
        .iter()
        .map(|q| {
            let (a, b) = q.split_once(" + ").unwrap();
            (a.parse::<i64>().unwrap() + b.parse::<i64>().unwrap()).to_string()
        })
        .collect();
    let body = serde_json::json!({"alarmLogId": session.alarm_log_id, "answers": answers});
    let uri = format!("/api/alarms/{}/missions/submit", alarm.id);
    let resp = app
        .oneshot(json_request("POST", &uri, &body.to_string()))
        .await
        .unwrap();
    let result: MissionResult = body_json(resp).await;
    assert!(result.is_completed);
    assert_eq!(result.correct_count, 2);
}

// --- todos ---

#[tokio::test]
async fn create_todo_is_enveloped() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/to-do",
            r#"{"eventDate":"2026-02-20","content":"buy milk"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let envelope: Envelope<Todo> = body_json(resp).await;
    assert!(envelope.success);
    let todo = envelope.result.unwrap();
    assert_eq!(todo.content, "buy milk");
}

#[tokio::test]
async fn list_todos_filters_by_date() {
    let app = app();
    for date in ["2026-02-20", "2026-02-21"] {
        let body = format!(r#"{{"eventDate":"{date}","content":"x"}}"#);
        app.clone()
            .oneshot(json_request("POST", "/api/to-do", &body))
            .await
            .unwrap();
    }

    let resp = app
        .oneshot(empty_request("GET", "/api/to-do?eventDate=2026-02-21"))
        .await
        .unwrap();
    let envelope: Envelope<Vec<Todo>> = body_json(resp).await;
    let todos = envelope.result.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].event_date, "2026-02-21");
}

#[tokio::test]
async fn empty_todo_content_is_rejected() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/to-do",
            r#"{"eventDate":"2026-02-20","content":"  "}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let envelope: Envelope<Value> = body_json(resp).await;
    assert!(!envelope.success);
    assert_eq!(envelope.code, "TODO_400");
}

#[tokio::test]
async fn delete_missing_todo_returns_404_envelope() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/api/to-do/77"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let envelope: Envelope<Value> = body_json(resp).await;
    assert!(!envelope.success);
}

#[tokio::test]
async fn home_lists_next_alarm_and_todays_todos() {
    let app = app();
    seed_alarm(&app).await;
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/to-do",
            r#"{"eventDate":"2026-02-20","content":"stretch"}"#,
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(empty_request("GET", "/api/home?today=2026-02-20"))
        .await
        .unwrap();
    let envelope: Envelope<HomeInfo> = body_json(resp).await;
    let home = envelope.result.unwrap();
    assert_eq!(home.next_alarm.unwrap().alarm_time, "07:00");
    assert_eq!(home.todos.len(), 1);
}

// --- member settings ---

#[tokio::test]
async fn settings_require_bearer_token() {
    let resp = app()
        .oneshot(json_request(
            "PATCH",
            "/api/members/me/theme",
            r#"{"theme":"DARK"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn settings_update_is_persisted() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(authed(
            "PATCH",
            "/api/members/me/mission-duration",
            r#"{"missionDuration":90}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let envelope: Envelope<Value> = body_json(resp).await;
    assert!(envelope.success);

    let resp = app
        .oneshot(authed("GET", "/api/members/me/settings", ""))
        .await
        .unwrap();
    let envelope: Envelope<Value> = body_json(resp).await;
    assert_eq!(envelope.result.unwrap()["missionDuration"], 90);
}

#[tokio::test]
async fn invalid_setting_value_returns_400() {
    let resp = app()
        .oneshot(authed(
            "PATCH",
            "/api/members/me/mission-level",
            r#"{"missionLevel":"EXTREME"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mission_log_of_another_alarm_returns_404() {
    let app = app();
    let first = seed_alarm(&app).await;
    let second = seed_alarm(&app).await;

    let uri = format!("/api/alarms/{}/missions/start", first.id);
    let resp = app
        .clone()
        .oneshot(empty_request("POST", &uri))
        .await
        .unwrap();
    let session: MissionSession = body_json(resp).await;

    let body = serde_json::json!({"alarmLogId": session.alarm_log_id, "answers": []});
    let uri = format!("/api/alarms/{}/missions/submit", second.id);
    let resp = app
        .clone()
        .oneshot(json_request("POST", &uri, &body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body = serde_json::json!({"alarmLogId": session.alarm_log_id, "distanceMeters": 10.0});
    let uri = format!("/api/alarms/{}/missions/walk", second.id);
    let resp = app
        .oneshot(json_request("POST", &uri, &body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
