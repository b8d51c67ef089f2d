use ratatui::style::{Color, Modifier, Style};

/// The two built-in palettes. `F2` flips between them at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

impl ThemeKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeKind::Dark),
            "light" => Some(ThemeKind::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeKind::Dark => ThemeKind::Light,
            ThemeKind::Light => ThemeKind::Dark,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub kind: ThemeKind,
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub system_text_style: Style,
    pub error_text_style: Style,
    pub selection_style: Style,

    // Chrome
    pub title_style: Style,
    pub greeting_style: Style,
    pub streaming_indicator_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,

    // Side panel
    pub panel_border_style: Style,
    pub panel_title_style: Style,
    pub panel_context_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
    pub input_placeholder_style: Style,
}

impl Theme {
    pub fn for_kind(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Dark => Self::dark_default(),
            ThemeKind::Light => Self::light(),
        }
    }

    pub fn dark_default() -> Self {
        Theme {
            kind: ThemeKind::Dark,
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            system_text_style: Style::default().fg(Color::DarkGray),
            error_text_style: Style::default().fg(Color::LightRed),
            selection_style: Style::default().bg(Color::Blue).fg(Color::White),

            title_style: Style::default().fg(Color::Gray),
            greeting_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
            streaming_indicator_style: Style::default().fg(Color::White),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),

            panel_border_style: Style::default().fg(Color::LightBlue),
            panel_title_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            panel_context_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_placeholder_style: Style::default().fg(Color::DarkGray),
        }
    }

    pub fn light() -> Self {
        Theme {
            kind: ThemeKind::Light,
            background_color: Color::White,
            user_prefix_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            assistant_text_style: Style::default().fg(Color::Black),
            system_text_style: Style::default().fg(Color::Gray),
            error_text_style: Style::default().fg(Color::Red),
            selection_style: Style::default().bg(Color::LightYellow).fg(Color::Black),

            title_style: Style::default().fg(Color::DarkGray),
            greeting_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            streaming_indicator_style: Style::default().fg(Color::Black),
            input_border_style: Style::default().fg(Color::Black),
            input_title_style: Style::default().fg(Color::DarkGray),

            panel_border_style: Style::default().fg(Color::Blue),
            panel_title_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            panel_context_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),

            input_text_style: Style::default().fg(Color::Black),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_placeholder_style: Style::default().fg(Color::Gray),
        }
    }
}
