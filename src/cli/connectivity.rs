//! `sidenote test`: one short request to check the API key and endpoint.

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::ChatMessage;
use crate::core::app::SessionContext;
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::constants::CONNECTIVITY_TEST_PROMPT;
use crate::core::message::Role;

const TEST_TIMEOUT: Duration = Duration::from_secs(60);
const TEST_CONVERSATION_ID: &str = "connectivity-test";

pub async fn run_connectivity_test(mut session: SessionContext) -> Result<(), Box<dyn Error>> {
    println!("Testing {} at {}...", session.model, session.base_url);

    let (service, mut rx) = ChatStreamService::new();
    let stream_id = session.allocate_stream_id();
    let cancel_token = CancellationToken::new();
    let messages = vec![ChatMessage {
        role: Role::User.as_str().to_string(),
        content: CONNECTIVITY_TEST_PROMPT.to_string(),
    }];
    service.spawn_stream(session.stream_params(
        TEST_CONVERSATION_ID,
        messages,
        cancel_token.clone(),
        stream_id,
    ));

    let outcome = match tokio::time::timeout(TEST_TIMEOUT, collect_reply(&mut rx, stream_id)).await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            cancel_token.cancel();
            Err(format!("no reply within {}s", TEST_TIMEOUT.as_secs()))
        }
    };

    // Reaching this point means a key was found; a missing key exits earlier.
    let has_api_key = !session.api_key.is_empty();
    match outcome {
        Ok(reply) => {
            info!(model = %session.model, "connectivity test succeeded");
            println!("✅ API is reachable");
            println!("Reply: {reply}");
            println!("API key found: {}", yes_no(has_api_key));
            Ok(())
        }
        Err(message) => {
            println!("❌ API test failed: {message}");
            println!("API key found: {}", yes_no(has_api_key));
            Err(message.into())
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Gather the full reply for `stream_id`. An empty completion counts as a
/// failure.
async fn collect_reply(
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    stream_id: u64,
) -> Result<String, String> {
    let mut reply = String::new();
    while let Some((message, id)) = rx.recv().await {
        if id != stream_id {
            continue;
        }
        match message {
            StreamMessage::Delta(content) => reply.push_str(&content),
            StreamMessage::Done { .. } if reply.trim().is_empty() => {
                return Err("the API returned an empty reply".to_string());
            }
            StreamMessage::Done { .. } => return Ok(reply),
            StreamMessage::Error(message) => return Err(message),
        }
    }
    Err("the stream ended without a reply".to_string())
}
