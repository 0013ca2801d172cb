use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::content_risk::{scan_quotes, RiskyQuote};
use crate::models::{QuoteCounts, QuoteFilter, QuoteListItem};
use crate::AppState;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuotesQuery {
    page_id: Option<String>,
    #[serde(default)]
    filter: QuoteFilter,
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ImportQuotesRequest {
    quotes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RiskyQuery {
    action: Option<String>,
}

#[derive(Serialize)]
struct QuotesListResponse {
    success: bool,
    quotes: Vec<QuoteListItem>,
    counts: QuoteCounts,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RiskyQuotesResponse {
    success: bool,
    action: &'static str,
    total_scanned: usize,
    risky_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_count: Option<usize>,
    risky_quotes: Vec<RiskyQuote>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/quotes")
            .route("", web::get().to(list_quotes))
            .route("", web::post().to(import_quotes))
            .route("/risky", web::get().to(check_risky_quotes))
            .route("/{id}", web::delete().to(delete_quote)),
    );
}

async fn list_quotes(state: web::Data<AppState>, query: web::Query<ListQuotesQuery>) -> impl Responder {
    let page_id = query.page_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let listed = state
        .db
        .list_quotes(page_id, query.filter, limit, offset)
        .and_then(|quotes| Ok((quotes, state.db.quote_counts(page_id)?)));

    match listed {
        Ok((quotes, counts)) => HttpResponse::Ok().json(QuotesListResponse {
            success: true,
            quotes,
            counts,
        }),
        Err(e) => {
            log::error!("Failed to list quotes: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list quotes")
        }
    }
}

async fn import_quotes(state: web::Data<AppState>, body: web::Json<ImportQuotesRequest>) -> impl Responder {
    if body.quotes.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "quotes must not be empty");
    }

    match state.db.insert_quotes(&body.quotes) {
        Ok(inserted) => {
            log::info!("Imported {} quotes", inserted);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "inserted": inserted
            }))
        }
        Err(e) => {
            log::error!("Failed to import quotes: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to import quotes")
        }
    }
}

async fn delete_quote(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.db.delete_quotes(std::slice::from_ref(&id)) {
        Ok(0) => error_response(StatusCode::NOT_FOUND, "Quote not found"),
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => {
            log::error!("Failed to delete quote {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete quote")
        }
    }
}

async fn check_risky_quotes(state: web::Data<AppState>, query: web::Query<RiskyQuery>) -> impl Responder {
    let delete = match query.action.as_deref() {
        None | Some("scan") => false,
        Some("delete") => true,
        Some(_) => return error_response(StatusCode::BAD_REQUEST, "action must be scan or delete"),
    };

    let quotes = match state.db.list_all_quotes() {
        Ok(quotes) => quotes,
        Err(e) => {
            log::error!("Failed to load quotes for risk scan: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load quotes");
        }
    };

    let risky_quotes = scan_quotes(&quotes);
    log::info!("Risk scan: {} of {} quotes flagged", risky_quotes.len(), quotes.len());

    let deleted_count = if delete && !risky_quotes.is_empty() {
        let ids: Vec<String> = risky_quotes.iter().map(|q| q.id.clone()).collect();
        match state.db.delete_quotes(&ids) {
            Ok(count) => {
                log::info!("Deleted {} risky quotes", count);
                Some(count)
            }
            Err(e) => {
                log::error!("Failed to delete risky quotes: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete risky quotes");
            }
        }
    } else if delete {
        Some(0)
    } else {
        None
    };

    HttpResponse::Ok().json(RiskyQuotesResponse {
        success: true,
        action: if delete { "deleted" } else { "scan" },
        total_scanned: quotes.len(),
        risky_count: risky_quotes.len(),
        deleted_count,
        risky_quotes,
    })
}
