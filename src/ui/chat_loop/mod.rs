//! The interactive session: terminal setup, the event loop, and key and
//! mouse routing.
//!
//! The [`App`] lives behind an async mutex shared by the loop and the key
//! handlers. Nothing outside the loop mutates it; stream tasks only send
//! messages back over a channel.

mod event_loop;
mod keybindings;
mod lifecycle;
mod mouse;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::app::App;

pub use event_loop::run_chat;

/// Shared access to the [`App`] for the loop and its handlers.
#[derive(Clone)]
pub struct AppHandle {
    inner: Arc<Mutex<App>>,
}

impl AppHandle {
    pub fn new(inner: Arc<Mutex<App>>) -> Self {
        Self { inner }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&App) -> R) -> R {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut App) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }
}
