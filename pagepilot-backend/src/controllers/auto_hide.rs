use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashSet;

use super::{error_response, submitted_token, PageQuery};
use crate::auto_hide::classifier::{parse_hide_types, should_hide};
use crate::models::{AutoHideConfigResponse, HiddenPost, UpsertAutoHideConfigRequest};
use crate::AppState;

/// Posts and ledger entries shown by the debug endpoint
const DEBUG_LIMIT: usize = 20;

#[derive(Serialize)]
struct ConfigResponse {
    success: bool,
    config: AutoHideConfigResponse,
}

#[derive(Serialize)]
struct DebugPost {
    id: String,
    status_type: String,
    should_hide: bool,
    already_hidden: bool,
}

#[derive(Serialize)]
struct DebugResponse {
    success: bool,
    config: AutoHideConfigResponse,
    hidden_posts: Vec<HiddenPost>,
    recent_posts: Vec<DebugPost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fb_error: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auto-hide")
            .route("/config", web::get().to(get_config))
            .route("/config", web::post().to(save_config))
            .route("/config", web::delete().to(delete_config))
            .route("/debug", web::get().to(debug_page)),
    );
}

async fn get_config(state: web::Data<AppState>, query: web::Query<PageQuery>) -> impl Responder {
    let page_id = match query.require() {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.db.get_auto_hide_config(page_id) {
        Ok(config) => HttpResponse::Ok().json(ConfigResponse {
            success: true,
            config: config
                .map(AutoHideConfigResponse::from)
                .unwrap_or_else(|| AutoHideConfigResponse::unconfigured(page_id)),
        }),
        Err(e) => {
            log::error!("Failed to load auto-hide config for {}: {}", page_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load auto-hide config")
        }
    }
}

async fn save_config(
    state: web::Data<AppState>,
    body: web::Json<UpsertAutoHideConfigRequest>,
) -> impl Responder {
    let page_id = match body.page_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return error_response(StatusCode::BAD_REQUEST, "pageId is required"),
    };

    let hide_types = body.hide_types.as_deref().map(|raw| parse_hide_types(Some(raw)));

    match state.db.upsert_auto_hide_config(
        page_id,
        body.enabled,
        submitted_token(body.post_token.as_deref()),
        hide_types.as_deref(),
    ) {
        Ok(config) => {
            log::info!("[auto-hide] Saved config for page {} (enabled: {})", page_id, config.enabled);
            HttpResponse::Ok().json(ConfigResponse {
                success: true,
                config: config.into(),
            })
        }
        Err(e) => {
            log::error!("Failed to save auto-hide config for {}: {}", page_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save auto-hide config")
        }
    }
}

async fn delete_config(state: web::Data<AppState>, query: web::Query<PageQuery>) -> impl Responder {
    let page_id = match query.require() {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.db.delete_auto_hide_config(page_id) {
        Ok(deleted) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "deleted": deleted
        })),
        Err(e) => {
            log::error!("Failed to delete auto-hide config for {}: {}", page_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete auto-hide config")
        }
    }
}

async fn debug_page(state: web::Data<AppState>, query: web::Query<PageQuery>) -> impl Responder {
    let page_id = match query.require() {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let config = match state.db.get_auto_hide_config(page_id) {
        Ok(Some(config)) => config,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "No auto-hide config for this page"),
        Err(e) => {
            log::error!("Failed to load auto-hide config for {}: {}", page_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load auto-hide config");
        }
    };

    let hidden_posts = match state.db.list_hidden_posts(page_id, DEBUG_LIMIT) {
        Ok(posts) => posts,
        Err(e) => {
            log::error!("Failed to list hidden posts for {}: {}", page_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list hidden posts");
        }
    };

    let mut recent_posts = Vec::new();
    let mut fb_error = None;
    match config.usable_token() {
        None => fb_error = Some("No post token configured".to_string()),
        Some(token) => match state.graph.list_recent_posts(page_id, token, DEBUG_LIMIT).await {
            Ok(posts) => {
                let hide_types: HashSet<String> = config.hide_types.iter().cloned().collect();
                for post in posts {
                    let already_hidden = match state.db.is_post_hidden(page_id, &post.id) {
                        Ok(hidden) => hidden,
                        Err(e) => {
                            log::error!("Ledger lookup failed for {}: {}", post.id, e);
                            false
                        }
                    };
                    recent_posts.push(DebugPost {
                        should_hide: should_hide(&post.status_type, &hide_types),
                        already_hidden,
                        id: post.id,
                        status_type: post.status_type,
                    });
                }
            }
            Err(e) => fb_error = Some(e.to_string()),
        },
    }

    HttpResponse::Ok().json(DebugResponse {
        success: true,
        config: config.into(),
        hidden_posts,
        recent_posts,
        fb_error,
    })
}
