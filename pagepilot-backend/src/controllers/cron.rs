use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder};

use super::error_response;
use crate::middleware::cron_auth::validate_cron_request;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/cron")
            .route("/auto-hide", web::get().to(run_auto_hide))
            .route("/auto-hide", web::post().to(run_auto_hide))
            .route("/auto-post", web::get().to(run_auto_post))
            .route("/auto-post", web::post().to(run_auto_post)),
    );
}

async fn run_auto_hide(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = validate_cron_request(state.config.cron_secret.as_deref(), &req) {
        return resp;
    }

    log::info!("[auto-hide] Sweep triggered via HTTP");
    match state.sweeper.run_hide_sweep().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            log::error!("[auto-hide] Sweep failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn run_auto_post(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = validate_cron_request(state.config.cron_secret.as_deref(), &req) {
        return resp;
    }

    log::info!("[auto-post] Run triggered via HTTP");
    match state.poster.run_auto_post().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            log::error!("[auto-post] Run failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
