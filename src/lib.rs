//! Sidenote is a terminal chat client for OpenAI-compatible LLM APIs.
//!
//! Highlighting text in the transcript and pressing the explain chord opens a
//! floating side chat that explains the selection, with its own conversation
//! and stream, while the main chat carries on.
//!
//! - [`core`] owns runtime state: conversations, the reveal animator, the
//!   side-chat lifecycle, configuration and streaming.
//! - [`ui`] renders the terminal interface and runs the event loop.
//! - [`api`] defines the chat payloads sent to and read from the API.
//! - [`cli`] parses arguments and dispatches into the chat loop or the
//!   configuration commands.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
