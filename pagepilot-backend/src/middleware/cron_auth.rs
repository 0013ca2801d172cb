// Cron endpoint authentication
// The cron routes are called by an external scheduler with a shared bearer
// secret. When no secret is configured they are open.

use actix_web::{HttpRequest, HttpResponse};

/// Bearer token from the Authorization header. Other schemes yield None.
pub fn extract_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

pub fn validate_cron_request(secret: Option<&str>, req: &HttpRequest) -> Result<(), HttpResponse> {
    let Some(secret) = secret else {
        return Ok(());
    };

    match extract_token(req) {
        Some(token) if token == secret => Ok(()),
        Some(_) => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Invalid cron secret"
        }))),
        None => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "No authorization token provided"
        }))),
    }
}
