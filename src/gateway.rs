use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::detail::{DetailRecord, Mode, Recommendation};
use crate::upload::StagedFile;

// ── Wire types ────────────────────────────────────────────────────────────────

/// One prior transcript entry as the backend expects it in `history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub text: String,
}

/// A chat turn. `message` may be empty when a resume is attached; the
/// controller guarantees at least one of the two is present before this is
/// ever built.
#[derive(Debug)]
pub struct TurnRequest {
    pub message: String,
    pub mode: Mode,
    pub history: Vec<HistoryEntry>,
    pub attachment: Option<StagedFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl TurnReply {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailRequest {
    pub title: String,
    pub mode: Mode,
}

#[derive(Debug, Clone)]
pub struct DetailReply {
    pub record: DetailRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParaphraseRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParaphraseReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub text: String,
}

impl ParaphraseReply {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Mode-dependent `details` payload, decoded in two steps so the typed
/// variant matches the requesting mode.
#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    details: serde_json::Value,
}

// ── Gateway ───────────────────────────────────────────────────────────────────

/// The three remote operations as single-attempt request/response calls.
/// Owns no conversation state — retry policy, staleness, and transcript
/// updates are all the controller's business.
pub struct HttpGateway {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http, endpoint })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint.trim_end_matches('/'))
    }

    /// POST /api/chat — multipart: message, mode, history (JSON), optional
    /// uploadedFile. Any non-2xx status is a transport-level failure; backend
    /// explanations only reach the transcript from successful replies.
    pub async fn submit_turn(&self, req: TurnRequest) -> Result<TurnReply> {
        let history = serde_json::to_string(&req.history)?;
        let mut form = reqwest::multipart::Form::new()
            .text("message", req.message)
            .text("mode", req.mode.as_str())
            .text("history", history);
        if let Some(file) = req.attachment {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str("application/pdf")?;
            form = form.part("uploadedFile", part);
        }

        let resp = self.http.post(self.url("/api/chat")).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("chat endpoint returned HTTP {status}"));
        }
        Ok(resp.json().await?)
    }

    /// POST /api/details — JSON `{title, mode}`; the reply's `details` object
    /// is decoded into the typed record for the requesting mode.
    pub async fn fetch_detail(&self, req: &DetailRequest) -> Result<DetailReply> {
        let resp = self.http.post(self.url("/api/details")).json(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("details endpoint returned HTTP {status}"));
        }
        let envelope: DetailEnvelope = resp.json().await?;
        let record = DetailRecord::from_json(req.mode, envelope.details)?;
        Ok(DetailReply { record })
    }

    /// POST /api/paraphrase — JSON `{text}` where text is "<label>: <value>".
    pub async fn paraphrase(&self, req: &ParaphraseRequest) -> Result<ParaphraseReply> {
        let resp = self.http.post(self.url("/api/paraphrase")).json(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("paraphrase endpoint returned HTTP {status}"));
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_reply_decodes_with_missing_fields() {
        let reply: TurnReply = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(reply.is_success());
        assert!(reply.response.is_empty());
        assert!(reply.recommendations.is_empty());
    }

    #[test]
    fn test_turn_reply_with_recommendations() {
        let reply: TurnReply = serde_json::from_str(
            r#"{"status":"success","response":"Here are some matches",
                "recommendations":[{"title":"Engineer A"},{"title":"Engineer B"}]}"#,
        )
        .unwrap();
        assert_eq!(reply.recommendations.len(), 2);
        assert_eq!(reply.recommendations[0].title, "Engineer A");
    }

    #[test]
    fn test_detail_request_wire_shape() {
        let req = DetailRequest { title: "Engineer A".into(), mode: Mode::Career };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Engineer A", "mode": "career"}));
    }

    #[test]
    fn test_history_entry_wire_shape() {
        let entry = HistoryEntry { sender: "You".into(), text: "hi".into() };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"sender":"You","text":"hi"}"#);
    }

    /// A 500 with a decodable JSON body must still surface as Err — backend
    /// text is only trusted on successful statuses.
    #[tokio::test]
    async fn test_error_status_is_transport_failure_even_with_json_body() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            // Drain the request until the closing multipart boundary arrives
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if buf.ends_with(b"--\r\n") || buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
            }
            let body = r#"{"status":"error","response":"backend exploded"}"#;
            let reply = format!(
                "HTTP/1.1 500 Internal Server Error\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                body.len(),
                body
            );
            sock.write_all(reply.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
        });

        let gateway = HttpGateway::new(endpoint, 5).unwrap();
        let req = TurnRequest {
            message: "hello".into(),
            mode: Mode::Career,
            history: Vec::new(),
            attachment: None,
        };
        assert!(gateway.submit_turn(req).await.is_err());
        server.await.unwrap();
    }
}
