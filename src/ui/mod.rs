//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the event loop that turns terminal input into
//!   [`crate::core::app::AppAction`]s and coordinates streaming.
//! - [`renderer`], [`transcript`] and [`side_panel`]: frame composition.
//! - [`theme`]: color and style policy.
//!
//! Rendering also records where things were drawn (transcript rows, the
//! side panel and its close button) so pointer events can be mapped back.

pub mod chat_loop;
pub mod renderer;
pub mod side_panel;
pub mod theme;
pub mod transcript;
