pub mod auto_hide;
pub mod auto_post;
pub mod cron;
pub mod health;
pub mod quotes;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Deserialize;

/// `?pageId=` query shared by the page-scoped endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_id: Option<String>,
}

impl PageQuery {
    /// Page id, or a 400 when it is missing or blank
    pub fn require(&self) -> Result<&str, HttpResponse> {
        self.page_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "pageId is required"))
    }
}

/// Blank tokens from the dashboard mean "keep the stored one"
pub fn submitted_token(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|t| !t.is_empty())
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "error": message.into()
    }))
}
