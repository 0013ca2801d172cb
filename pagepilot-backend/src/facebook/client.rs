use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{GraphError, PageGraph, PagePost, MIN_SCHEDULE_LEAD_MINUTES};

/// Graph API client over reqwest
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GraphList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: Option<String>,
    status_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawScheduledPost {
    /// Documented as an integer but has been seen as a string
    scheduled_publish_time: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    success: Option<bool>,
}

impl SuccessResponse {
    fn is_confirmed(&self) -> bool {
        self.success == Some(true)
    }
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    id: Option<String>,
    post_id: Option<String>,
}

impl GraphClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Read a Graph response body, turning an `error` object into [`GraphError::Api`]
async fn read_graph_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GraphError> {
    let status = response.status();
    let body = response.text().await?;
    parse_graph_body(status, &body)
}

fn parse_graph_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, GraphError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GraphError::InvalidResponse(format!("HTTP {}: {}", status, e)))?;

    if let Some(error) = value.get("error") {
        return Err(GraphError::Api {
            code: error
                .get("code")
                .and_then(Value::as_i64)
                .unwrap_or(status.as_u16() as i64),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Graph API error")
                .to_string(),
        });
    }

    if !status.is_success() {
        return Err(GraphError::InvalidResponse(format!("HTTP {}", status)));
    }

    serde_json::from_value(value).map_err(|e| GraphError::InvalidResponse(e.to_string()))
}

fn parse_publish_time(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl PageGraph for GraphClient {
    async fn list_recent_posts(
        &self,
        page_id: &str,
        token: &str,
        limit: usize,
    ) -> Result<Vec<PagePost>, GraphError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.url(&format!("{}/posts", page_id)))
            .query(&[
                ("fields", "id,status_type"),
                ("limit", limit.as_str()),
                ("access_token", token),
            ])
            .send()
            .await?;

        let list: GraphList<RawPost> = read_graph_json(response).await?;
        let total = list.data.len();

        // Posts without a status type (plain page updates) can't be classified
        let posts: Vec<PagePost> = list
            .data
            .into_iter()
            .filter_map(|raw| match (raw.id, raw.status_type) {
                (Some(id), Some(status_type)) => Some(PagePost { id, status_type }),
                _ => None,
            })
            .collect();

        log::debug!(
            "[graph] Page {}: {} posts returned, {} classifiable",
            page_id,
            total,
            posts.len()
        );

        Ok(posts)
    }

    async fn hide_post(&self, post_id: &str, token: &str) -> Result<bool, GraphError> {
        let response = self
            .client
            .post(self.url(post_id))
            .query(&[("timeline_visibility", "hidden"), ("access_token", token)])
            .send()
            .await?;

        let result: SuccessResponse = read_graph_json(response).await?;
        Ok(result.is_confirmed())
    }

    async fn scheduled_publish_times(&self, page_id: &str, token: &str) -> Result<Vec<i64>, GraphError> {
        let response = self
            .client
            .get(self.url(&format!("{}/scheduled_posts", page_id)))
            .query(&[("fields", "scheduled_publish_time"), ("access_token", token)])
            .send()
            .await?;

        let list: GraphList<RawScheduledPost> = read_graph_json(response).await?;

        Ok(list
            .data
            .iter()
            .filter_map(|p| p.scheduled_publish_time.as_ref().and_then(parse_publish_time))
            .collect())
    }

    async fn publish_text_post(
        &self,
        page_id: &str,
        token: &str,
        message: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<String, GraphError> {
        let min_time = Utc::now() + ChronoDuration::minutes(MIN_SCHEDULE_LEAD_MINUTES);
        let scheduled_at = scheduled_at.filter(|t| *t > min_time);

        let body = match scheduled_at {
            Some(at) => json!({
                "message": message,
                "published": false,
                "scheduled_publish_time": at.timestamp(),
            }),
            None => json!({ "message": message }),
        };

        log::info!(
            "[graph] Creating {} text post for page {}",
            if scheduled_at.is_some() { "scheduled" } else { "immediate" },
            page_id
        );

        let response = self
            .client
            .post(self.url(&format!("{}/feed", page_id)))
            .query(&[("access_token", token)])
            .json(&body)
            .send()
            .await?;

        let result: PublishResponse = read_graph_json(response).await?;

        result
            .post_id
            .or(result.id)
            .ok_or_else(|| GraphError::InvalidResponse("publish response has no post id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_publish_time() {
        assert_eq!(parse_publish_time(&json!(1700000000)), Some(1700000000));
        assert_eq!(parse_publish_time(&json!("1700000000")), Some(1700000000));
        assert_eq!(parse_publish_time(&json!("soon")), None);
        assert_eq!(parse_publish_time(&Value::Null), None);
    }

    #[test]
    fn test_raw_posts_ignore_extra_fields() {
        let list: GraphList<RawPost> = serde_json::from_value(json!({
            "data": [
                {"id": "1_2", "status_type": "shared_story", "message": "hi"},
                {"id": "1_3"}
            ],
            "paging": {"next": "https://example.invalid"}
        }))
        .unwrap();

        assert_eq!(list.data.len(), 2);
        assert_eq!(list.data[0].status_type.as_deref(), Some("shared_story"));
        assert!(list.data[1].status_type.is_none());
    }

    #[test]
    fn test_missing_data_is_empty() {
        let list: GraphList<RawPost> = serde_json::from_value(json!({})).unwrap();
        assert!(list.data.is_empty());
    }

    #[test]
    fn test_error_object_becomes_api_error() {
        let body = r#"{"error":{"message":"Error validating access token","type":"OAuthException","code":190}}"#;
        let result: Result<SuccessResponse, _> = parse_graph_body(StatusCode::BAD_REQUEST, body);
        match result {
            Err(GraphError::Api { code, message }) => {
                assert_eq!(code, 190);
                assert_eq!(message, "Error validating access token");
            }
            other => panic!("expected Api error, got {:?}", other),
        }

        // An error object wins even on a 200
        let result: Result<SuccessResponse, _> =
            parse_graph_body(StatusCode::OK, r#"{"error":{"message":"nope"}}"#);
        assert!(matches!(result, Err(GraphError::Api { code: 200, .. })));
    }

    #[test]
    fn test_non_success_without_error_object_is_invalid() {
        let result: Result<SuccessResponse, _> =
            parse_graph_body(StatusCode::INTERNAL_SERVER_ERROR, r#"{"success":true}"#);
        assert!(matches!(result, Err(GraphError::InvalidResponse(_))));

        let result: Result<SuccessResponse, _> = parse_graph_body(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(result, Err(GraphError::InvalidResponse(_))));
    }

    #[test]
    fn test_hide_confirmed_only_on_success_true() {
        let confirmed: SuccessResponse = parse_graph_body(StatusCode::OK, r#"{"success":true}"#).unwrap();
        assert!(confirmed.is_confirmed());

        let refused: SuccessResponse = parse_graph_body(StatusCode::OK, r#"{"success":false}"#).unwrap();
        assert!(!refused.is_confirmed());

        let missing: SuccessResponse = parse_graph_body(StatusCode::OK, "{}").unwrap();
        assert!(!missing.is_confirmed());
    }

    #[test]
    fn test_scheduled_list_without_data_field() {
        let list: GraphList<RawScheduledPost> = parse_graph_body(StatusCode::OK, "{}").unwrap();
        assert!(list.data.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = GraphClient::new("https://graph.facebook.com/v21.0/").unwrap();
        assert_eq!(client.url("123/posts"), "https://graph.facebook.com/v21.0/123/posts");
    }
}
