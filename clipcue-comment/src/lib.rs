//! Client for the comment-generation API.
//!
//! The API is a black box over HTTP: one `POST generate` endpoint taking the
//! extracted `{title, url}` record and answering
//! `{"success": bool, "comment"?: string, "error"?: string}`. Failures are
//! terminal: an unhappy answer becomes a user-visible message, never a
//! retry.

use std::time::Duration;

use clipcue_common::VideoInfo;
use clipcue_http::{HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};

// Comment generation sits on an LLM call; give it more room than the
// client's default request timeout.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Shown when the API answered a bad status without usable error text.
pub const GENERIC_REQUEST_FAILED: &str = "API请求失败";
/// Shown when the API answered 2xx but reported failure without error text.
pub const GENERIC_API_ERROR: &str = "API返回错误";

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    /// The API reported a failure; the payload is the user-visible text.
    #[error("{0}")]
    Upstream(String),
    /// The request never produced a usable API answer.
    #[error(transparent)]
    Http(#[from] HttpError),
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    title: &'a str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Handle to the comment-generation endpoint.
pub struct CommentApi {
    http: HttpClient,
    auth_token: Option<String>,
}

impl CommentApi {
    /// Create a client for the API at `endpoint` (the `generate` route is
    /// resolved relative to it).
    pub fn new(endpoint: &str, auth_token: Option<String>) -> Result<Self, HttpError> {
        let http = HttpClient::new(endpoint)?.with_timeout(GENERATE_TIMEOUT);
        Ok(Self { http, auth_token })
    }

    /// Ask the API for a comment matching the extracted video record.
    ///
    /// A non-2xx answer or a `success: false` body surfaces as
    /// [`CommentError::Upstream`] carrying the error text the API provided,
    /// or a generic fallback when it provided none.
    pub async fn generate(&self, video: &VideoInfo) -> Result<String, CommentError> {
        let req = GenerateRequest {
            title: &video.title,
            url: &video.url,
        };
        let opts = RequestOpts {
            bearer: self.auth_token.as_deref(),
            ..Default::default()
        };

        let resp: GenerateResponse = match self.http.post_json("generate", &req, opts).await {
            Ok(resp) => resp,
            Err(HttpError::Api { status, message }) => {
                tracing::warn!(%status, message=%message, "comment.api_status_error");
                let text = if message.trim().is_empty() {
                    GENERIC_REQUEST_FAILED.to_string()
                } else {
                    message
                };
                return Err(CommentError::Upstream(text));
            }
            Err(other) => return Err(other.into()),
        };

        unwrap_comment(resp)
    }
}

fn unwrap_comment(resp: GenerateResponse) -> Result<String, CommentError> {
    if !resp.success {
        let text = resp
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| GENERIC_API_ERROR.to_string());
        return Err(CommentError::Upstream(text));
    }
    match resp.comment.filter(|c| !c.trim().is_empty()) {
        Some(comment) => Ok(comment),
        None => Err(CommentError::Upstream(GENERIC_API_ERROR.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(success: bool, comment: Option<&str>, error: Option<&str>) -> GenerateResponse {
        GenerateResponse {
            success,
            comment: comment.map(|s| s.to_string()),
            error: error.map(|s| s.to_string()),
        }
    }

    #[test]
    fn success_yields_comment() {
        let got = unwrap_comment(resp(true, Some("拍得真好，已三连"), None)).unwrap();
        assert_eq!(got, "拍得真好，已三连");
    }

    #[test]
    fn failure_uses_provided_error_text() {
        let err = unwrap_comment(resp(false, None, Some("评论生成失败，请稍后再试"))).unwrap_err();
        assert_eq!(err.to_string(), "评论生成失败，请稍后再试");
    }

    #[test]
    fn failure_without_text_uses_generic_message() {
        let err = unwrap_comment(resp(false, None, None)).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_API_ERROR);

        let err = unwrap_comment(resp(false, None, Some("  "))).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_API_ERROR);
    }

    #[test]
    fn success_without_comment_is_still_an_error() {
        let err = unwrap_comment(resp(true, None, None)).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_API_ERROR);
    }
}
