//! Shared constants used across the application

use std::time::Duration;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Milliseconds per revealed character.
pub const DEFAULT_REVEAL_SPEED_MS: i64 = 10;

pub const DEFAULT_EXPLAIN_CHORD: &str = "ctrl+shift+e";

pub const DEFAULT_USER_NAME: &str = "there";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_GENERATIVE_AI_API_KEY", "OPENAI_API_KEY"];

pub const BASE_URL_ENV_VAR: &str = "SIDENOTE_BASE_URL";

pub const LOG_FILTER_ENV_VAR: &str = "SIDENOTE_LOG";

pub const MAIN_CONVERSATION_ID: &str = "main-chat";

/// Characters of the containing block kept as selection context.
pub const CONTEXT_CHAR_LIMIT: usize = 200;

/// Characters of the highlighted text quoted in the explanation prompt.
pub const EXPLAIN_TEXT_LIMIT: usize = 100;

/// Characters of the highlighted text shown in the side panel title.
pub const PANEL_TITLE_LIMIT: usize = 45;

/// Delay between opening a side chat and sending its first request, so the
/// panel is drawn before the request goes out.
pub const INTRO_DELAY: Duration = Duration::from_millis(100);

pub const CONNECTIVITY_TEST_PROMPT: &str =
    "Hello, this is a test. Respond with \"API is working!\"";

