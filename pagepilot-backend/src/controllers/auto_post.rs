use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{error_response, submitted_token, PageQuery};
use crate::models::{
    AutoPostLog, AutoPostScheduleResponse, AutoPostScheduleUpdate, UpsertAutoPostScheduleRequest,
};
use crate::schedule::{next_scheduled_time, parse_schedule_minutes};
use crate::AppState;

const DEFAULT_LOG_LIMIT: usize = 10;
const MAX_LOG_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogsQuery {
    page_id: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ScheduleResponse {
    success: bool,
    config: Option<AutoPostScheduleResponse>,
}

#[derive(Serialize)]
struct LogsResponse {
    success: bool,
    logs: Vec<AutoPostLog>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auto-post")
            .route("/config", web::get().to(get_schedule))
            .route("/config", web::post().to(save_schedule))
            .route("/logs", web::get().to(list_logs)),
    );
}

async fn get_schedule(state: web::Data<AppState>, query: web::Query<PageQuery>) -> impl Responder {
    let page_id = match query.require() {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.db.get_auto_post_schedule(page_id) {
        Ok(schedule) => HttpResponse::Ok().json(ScheduleResponse {
            success: true,
            config: schedule.map(Into::into),
        }),
        Err(e) => {
            log::error!("Failed to load auto-post schedule for {}: {}", page_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load auto-post schedule")
        }
    }
}

async fn save_schedule(
    state: web::Data<AppState>,
    body: web::Json<UpsertAutoPostScheduleRequest>,
) -> impl Responder {
    let page_id = match body.page_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return error_response(StatusCode::BAD_REQUEST, "pageId is required"),
    };

    if let Some(spec) = body.schedule_minutes.as_deref() {
        if parse_schedule_minutes(spec).is_empty() {
            return error_response(
                StatusCode::BAD_REQUEST,
                "scheduleMinutes must list minutes between 0 and 59",
            );
        }
    }
    if matches!(body.interval_minutes, Some(m) if m <= 0) {
        return error_response(StatusCode::BAD_REQUEST, "intervalMinutes must be positive");
    }

    let update = AutoPostScheduleUpdate {
        enabled: body.enabled,
        interval_minutes: body.interval_minutes,
        schedule_minutes: body.schedule_minutes.as_deref(),
        post_token: submitted_token(body.post_token.as_deref()),
    };

    let saved = state.db.upsert_auto_post_schedule(page_id, &update).and_then(|schedule| {
        let next = schedule
            .enabled
            .then(|| next_scheduled_time(&schedule.schedule_minutes, Utc::now()));
        state.db.set_next_post_at(page_id, next)?;
        state.db.get_auto_post_schedule(page_id)
    });

    match saved {
        Ok(schedule) => {
            log::info!("[auto-post] Saved schedule for page {}", page_id);
            HttpResponse::Ok().json(ScheduleResponse {
                success: true,
                config: schedule.map(Into::into),
            })
        }
        Err(e) => {
            log::error!("Failed to save auto-post schedule for {}: {}", page_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save auto-post schedule")
        }
    }
}

async fn list_logs(state: web::Data<AppState>, query: web::Query<LogsQuery>) -> impl Responder {
    let page_id = match query.page_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return error_response(StatusCode::BAD_REQUEST, "pageId is required"),
    };
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);

    match state.db.list_auto_post_logs(page_id, limit) {
        Ok(logs) => HttpResponse::Ok().json(LogsResponse { success: true, logs }),
        Err(e) => {
            log::error!("Failed to list auto-post logs for {}: {}", page_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list auto-post logs")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::test_state;
    use crate::models::{AutoPostLogStatus, NewAutoPostLog};
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_enabling_sets_next_post_time() {
        let state = web::Data::new(test_state(Vec::new(), None));
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/auto-post/config?pageId=p1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["config"].is_null());

        let req = test::TestRequest::post()
            .uri("/api/auto-post/config")
            .set_json(serde_json::json!({
                "pageId": "p1",
                "enabled": true,
                "scheduleMinutes": "00,30",
                "postToken": "tok"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["config"]["schedule_minutes"], "00,30");
        assert!(body["config"]["next_post_at"].is_string());

        let req = test::TestRequest::post()
            .uri("/api/auto-post/config")
            .set_json(serde_json::json!({ "pageId": "p1", "enabled": false }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["config"]["enabled"], false);
        assert!(body["config"]["next_post_at"].is_null());
        assert_eq!(body["config"]["has_post_token"], true);
    }

    #[actix_web::test]
    async fn test_blank_token_keeps_stored_one() {
        let state = web::Data::new(test_state(Vec::new(), None));
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/auto-post/config")
            .set_json(serde_json::json!({ "pageId": "p1", "enabled": true, "postToken": "tok" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/auto-post/config")
            .set_json(serde_json::json!({ "pageId": "p1", "enabled": true, "postToken": "" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["config"]["has_post_token"], true);

        let stored = state.db.get_auto_post_schedule("p1").unwrap().unwrap();
        assert_eq!(stored.post_token.as_deref(), Some("tok"));
    }

    #[actix_web::test]
    async fn test_invalid_schedule_is_rejected() {
        let state = web::Data::new(test_state(Vec::new(), None));
        let app = test::init_service(App::new().app_data(state).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/auto-post/config")
            .set_json(serde_json::json!({ "pageId": "p1", "scheduleMinutes": "75, x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_logs_limit_is_capped() {
        let state = web::Data::new(test_state(Vec::new(), None));
        for _ in 0..3 {
            state
                .db
                .insert_auto_post_log(&NewAutoPostLog {
                    page_id: "p1",
                    quote_id: None,
                    quote_text: None,
                    status: AutoPostLogStatus::Failed,
                    error_message: Some("boom"),
                    facebook_post_id: None,
                    scheduled_for: None,
                })
                .unwrap();
        }
        let app = test::init_service(App::new().app_data(state).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/auto-post/logs?pageId=p1&limit=2").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["logs"].as_array().unwrap().len(), 2);
        assert_eq!(body["logs"][0]["status"], "failed");

        let req = test::TestRequest::get().uri("/api/auto-post/logs?pageId=p1&limit=1000").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["logs"].as_array().unwrap().len(), 3);
    }
}
