//! Context-aware keybinding registry
//!
//! Handlers are registered per [`KeyContext`] and key pattern. Keys no
//! handler claims fall through to the focused text input.

use std::collections::HashMap;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::{AppActionContext, AppActionDispatcher, UiFocus};
use crate::ui::chat_loop::AppHandle;

// ============================================================================
// Types and Traits
// ============================================================================

/// Result of handling a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled and the loop keeps running
    Handled,
    /// Key was handled and the loop should exit
    Exit,
    /// Key was not handled by this handler
    NotHandled,
}

impl From<bool> for KeyResult {
    fn from(handled: bool) -> Self {
        if handled {
            KeyResult::Handled
        } else {
            KeyResult::NotHandled
        }
    }
}

/// Trait for keybinding handlers
#[async_trait::async_trait]
pub trait KeyHandler: Send + Sync {
    async fn handle(
        &self,
        app: &AppHandle,
        dispatcher: &AppActionDispatcher,
        key: &KeyEvent,
        ctx: AppActionContext,
    ) -> KeyResult;
}

/// Pattern for matching key events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPattern {
    pub fn simple(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code && self.modifiers == key.modifiers
    }
}

impl From<&KeyEvent> for KeyPattern {
    fn from(key: &KeyEvent) -> Self {
        Self {
            code: key.code,
            modifiers: key.modifiers,
        }
    }
}

// ============================================================================
// Context and Registry
// ============================================================================

/// Which input the key is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    MainInput,
    SideInput,
}

impl KeyContext {
    pub fn from_focus(focus: UiFocus, side_open: bool) -> Self {
        match focus {
            UiFocus::SideInput if side_open => KeyContext::SideInput,
            _ => KeyContext::MainInput,
        }
    }
}

pub struct ModeAwareRegistry {
    handlers: HashMap<KeyContext, HashMap<KeyPattern, Box<dyn KeyHandler>>>,
}

impl ModeAwareRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register_for_context(
        &mut self,
        context: KeyContext,
        pattern: KeyPattern,
        handler: Box<dyn KeyHandler>,
    ) {
        self.handlers
            .entry(context)
            .or_default()
            .insert(pattern, handler);
    }

    /// Plain and shifted characters always go straight to the text input.
    pub fn should_handle_as_text_input(&self, key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char(_))
            && !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    }

    pub async fn handle_key_event(
        &self,
        app: &AppHandle,
        dispatcher: &AppActionDispatcher,
        key: &KeyEvent,
        context: KeyContext,
        ctx: AppActionContext,
    ) -> KeyResult {
        let Some(handler) = self
            .handlers
            .get(&context)
            .and_then(|handlers| handlers.get(&KeyPattern::from(key)))
        else {
            return KeyResult::NotHandled;
        };
        handler.handle(app, dispatcher, key, ctx).await
    }
}

impl Default for ModeAwareRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for creating a fully configured registry
pub struct ModeAwareBuilder {
    registry: ModeAwareRegistry,
}

impl ModeAwareBuilder {
    pub fn new() -> Self {
        Self {
            registry: ModeAwareRegistry::new(),
        }
    }

    pub fn build(self) -> ModeAwareRegistry {
        self.registry
    }

    pub fn register_for_context(
        mut self,
        context: KeyContext,
        pattern: KeyPattern,
        handler: Box<dyn KeyHandler>,
    ) -> Self {
        self.registry
            .register_for_context(context, pattern, handler);
        self
    }

    /// Register the same binding in every context.
    pub fn register_everywhere<H>(mut self, pattern: KeyPattern, handler: H) -> Self
    where
        H: KeyHandler + Clone + 'static,
    {
        for context in [KeyContext::MainInput, KeyContext::SideInput] {
            self.registry
                .register_for_context(context, pattern.clone(), Box::new(handler.clone()));
        }
        self
    }
}

impl Default for ModeAwareBuilder {
    fn default() -> Self {
        Self::new()
    }
}
