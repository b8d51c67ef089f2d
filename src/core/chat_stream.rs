//! Streaming client for OpenAI-compatible `chat/completions` endpoints.
//!
//! Each request runs on its own task and reports back over a shared channel,
//! tagging every message with the stream id it belongs to. Callers decide
//! which ids they still care about.

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ChatMessage, ChatRequest, ChatResponse, StreamOptions, Usage};
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Delta(String),
    Done {
        finish_reason: Option<String>,
        usage: Option<Usage>,
    },
    Error(String),
}

/// Finish metadata seen so far; emitted with [`StreamMessage::Done`].
#[derive(Default)]
struct FinishState {
    finish_reason: Option<String>,
    usage: Option<Usage>,
}

impl FinishState {
    fn into_done(self) -> StreamMessage {
        StreamMessage::Done {
            finish_reason: self.finish_reason,
            usage: self.usage,
        }
    }
}

type StreamSender = mpsc::UnboundedSender<(StreamMessage, u64)>;

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

enum LineOutcome {
    Continue,
    Finished,
}

fn handle_data_payload(
    payload: &str,
    finish: &mut FinishState,
    tx: &StreamSender,
    stream_id: u64,
) -> LineOutcome {
    if payload == "[DONE]" {
        let _ = tx.send((std::mem::take(finish).into_done(), stream_id));
        return LineOutcome::Finished;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) if response.error.is_some() => {
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            LineOutcome::Finished
        }
        Ok(response) => {
            if let Some(usage) = response.usage {
                finish.usage = Some(usage);
            }
            if let Some(choice) = response.choices.into_iter().next() {
                if let Some(content) = choice.delta.content {
                    if !content.is_empty() {
                        let _ = tx.send((StreamMessage::Delta(content), stream_id));
                    }
                }
                if choice.finish_reason.is_some() {
                    finish.finish_reason = choice.finish_reason;
                }
            }
            LineOutcome::Continue
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return LineOutcome::Continue;
            }
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            LineOutcome::Finished
        }
    }
}

fn process_sse_line(
    line: &str,
    finish: &mut FinishState,
    tx: &StreamSender,
    stream_id: u64,
) -> LineOutcome {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, finish, tx, stream_id))
        .unwrap_or(LineOutcome::Continue)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        // Gemini wraps errors in a one-element array.
        .or_else(|| {
            value
                .pointer("/0/error/message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| crate::utils::text::collapse_whitespace(&text))
}

/// Turn an error body into a short, human readable message.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error: <empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("API Error: {summary}");
            }
        }
        if let Ok(compact) = serde_json::to_string(&json_value) {
            return format!("API Error: {compact}");
        }
    }

    format!(
        "API Error: {}",
        crate::utils::text::collapse_whitespace(trimmed)
    )
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub conversation_id: String,
    pub api_messages: Vec<ChatMessage>,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: StreamSender,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let cancel_token = params.cancel_token.clone();
            let stream_id = params.stream_id;
            let conversation_id = params.conversation_id.clone();
            tokio::select! {
                _ = run_stream(params, tx) => {
                    debug!(stream_id, conversation = %conversation_id, "stream finished");
                }
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, conversation = %conversation_id, "stream cancelled");
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn run_stream(params: StreamParams, tx: StreamSender) {
    let StreamParams {
        client,
        base_url,
        api_key,
        model,
        temperature,
        conversation_id,
        api_messages,
        cancel_token,
        stream_id,
    } = params;

    debug!(
        stream_id,
        conversation = %conversation_id,
        messages = api_messages.len(),
        %model,
        "starting stream"
    );

    let request = ChatRequest {
        model,
        messages: api_messages,
        stream: true,
        temperature,
        stream_options: Some(StreamOptions {
            include_usage: true,
        }),
    };

    let response = client
        .post(construct_api_url(&base_url, "chat/completions"))
        .header("Content-Type", "application/json")
        .bearer_auth(&api_key)
        .json(&request)
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send((StreamMessage::Error(format_api_error(&e.to_string())), stream_id));
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        debug!(stream_id, %status, "stream request rejected");
        let _ = tx.send((StreamMessage::Error(format_api_error(&error_text)), stream_id));
        return;
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut finish = FinishState::default();

    while let Some(chunk) = stream.next().await {
        if cancel_token.is_cancelled() {
            return;
        }

        let chunk_bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send((StreamMessage::Error(format_api_error(&e.to_string())), stream_id));
                return;
            }
        };
        buffer.extend_from_slice(&chunk_bytes);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let outcome = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(line) => process_sse_line(line.trim(), &mut finish, &tx, stream_id),
                Err(e) => {
                    debug!(stream_id, error = %e, "skipping invalid UTF-8 line");
                    LineOutcome::Continue
                }
            };
            buffer.drain(..=newline_pos);
            if matches!(outcome, LineOutcome::Finished) {
                return;
            }
        }
    }

    // Some providers close the body without a `[DONE]` sentinel.
    if let Ok(rest) = std::str::from_utf8(&buffer) {
        if let LineOutcome::Finished = process_sse_line(rest.trim(), &mut finish, &tx, stream_id) {
            return;
        }
    }
    let _ = tx.send((finish.into_done(), stream_id));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>) -> Vec<(StreamMessage, u64)> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn sse_lines_with_and_without_spacing_yield_deltas() {
        let (service, mut rx) = ChatStreamService::new();
        let mut finish = FinishState::default();

        for line in [
            r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#,
            r#"data:{"choices":[{"delta":{"content":" world"}}]}"#,
        ] {
            assert!(matches!(
                process_sse_line(line, &mut finish, &service.tx, 5),
                LineOutcome::Continue
            ));
        }

        assert_eq!(
            drain(&mut rx),
            [
                (StreamMessage::Delta("Hello".into()), 5),
                (StreamMessage::Delta(" world".into()), 5)
            ]
        );
    }

    #[test]
    fn done_carries_finish_reason_and_usage() {
        let (service, mut rx) = ChatStreamService::new();
        let mut finish = FinishState::default();
        let lines = [
            r#"data: {"choices":[{"delta":{"content":"Hi"},"finish_reason":"stop"}]}"#,
            r#"data: {"choices":[],"usage":{"prompt_tokens":4,"completion_tokens":1,"total_tokens":5}}"#,
            "",
            ": keep-alive comment",
        ];
        for line in lines {
            assert!(matches!(
                process_sse_line(line, &mut finish, &service.tx, 1),
                LineOutcome::Continue
            ));
        }
        assert!(matches!(
            process_sse_line("data: [DONE]", &mut finish, &service.tx, 1),
            LineOutcome::Finished
        ));

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[1],
            (
                StreamMessage::Done {
                    finish_reason: Some("stop".into()),
                    usage: Some(Usage {
                        prompt_tokens: 4,
                        completion_tokens: 1,
                        total_tokens: 5
                    }),
                },
                1
            )
        );
    }

    #[test]
    fn in_band_error_ends_stream() {
        let (service, mut rx) = ChatStreamService::new();
        let mut finish = FinishState::default();
        let line = r#"data: {"error":{"message":"internal   server error"}}"#;

        assert!(matches!(
            process_sse_line(line, &mut finish, &service.tx, 9),
            LineOutcome::Finished
        ));
        assert_eq!(
            drain(&mut rx),
            [(StreamMessage::Error("API Error: internal server error".into()), 9)]
        );
    }

    #[test]
    fn malformed_payload_ends_stream_with_error() {
        let (service, mut rx) = ChatStreamService::new();
        let mut finish = FinishState::default();

        assert!(matches!(
            process_sse_line("data: not json", &mut finish, &service.tx, 9),
            LineOutcome::Finished
        ));
        assert_eq!(
            drain(&mut rx),
            [(StreamMessage::Error("API Error: not json".into()), 9)]
        );
    }

    #[test]
    fn api_errors_are_summarised() {
        assert_eq!(
            format_api_error(r#"{"error":{"message":"model   overloaded","code":503}}"#),
            "API Error: model overloaded"
        );
        assert_eq!(
            format_api_error(r#"[{"error":{"code":400,"message":"API key not valid."}}]"#),
            "API Error: API key not valid."
        );
        assert_eq!(
            format_api_error(r#"{"status":"failed"}"#),
            r#"API Error: {"status":"failed"}"#
        );
        assert_eq!(format_api_error("  "), "API Error: <empty response>");
        assert_eq!(format_api_error("bad\ngateway"), "API Error: bad gateway");
    }
}
