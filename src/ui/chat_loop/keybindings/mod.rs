//! Keybindings for the two text inputs.
//!
//! The explain chord is not in the registry: it is checked before any
//! binding, in every context, because it is configurable and must never
//! reach a text input.

pub mod handlers;
pub mod registry;

pub use registry::{KeyContext, KeyResult, ModeAwareRegistry};

/// Build the registry with every binding
pub fn build_mode_aware_registry() -> ModeAwareRegistry {
    use handlers::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use registry::{KeyPattern, ModeAwareBuilder};

    ModeAwareBuilder::new()
        .register_everywhere(KeyPattern::ctrl(KeyCode::Char('c')), CtrlCHandler)
        .register_everywhere(KeyPattern::simple(KeyCode::Enter), SimpleAction::Submit)
        .register_everywhere(
            KeyPattern::with_modifiers(KeyCode::Enter, KeyModifiers::ALT),
            NewlineHandler,
        )
        .register_everywhere(
            KeyPattern::with_modifiers(KeyCode::Enter, KeyModifiers::SHIFT),
            NewlineHandler,
        )
        .register_everywhere(KeyPattern::simple(KeyCode::Tab), SimpleAction::ToggleFocus)
        .register_everywhere(KeyPattern::simple(KeyCode::F(2)), SimpleAction::ToggleTheme)
        .register_everywhere(KeyPattern::simple(KeyCode::PageUp), SimpleAction::PageUp)
        .register_everywhere(KeyPattern::simple(KeyCode::PageDown), SimpleAction::PageDown)
        .register_everywhere(
            KeyPattern::with_modifiers(KeyCode::Up, KeyModifiers::SHIFT),
            SimpleAction::LineUp,
        )
        .register_everywhere(
            KeyPattern::with_modifiers(KeyCode::Down, KeyModifiers::SHIFT),
            SimpleAction::LineDown,
        )
        .register_for_context(
            KeyContext::MainInput,
            KeyPattern::simple(KeyCode::Esc),
            Box::new(MainEscapeHandler),
        )
        .register_for_context(
            KeyContext::SideInput,
            KeyPattern::simple(KeyCode::Esc),
            Box::new(SideEscapeHandler),
        )
        .build()
}
