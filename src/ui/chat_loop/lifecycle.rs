use std::{error::Error, io, io::Write, sync::Arc};

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::Terminal;
use tokio::sync::Mutex;
use tracing::debug;

pub type SharedTerminal<W = io::Stdout> = Arc<Mutex<Terminal<CrosstermBackend<W>>>>;

/// Terminal modes switched on for the session, so exactly those are undone.
#[derive(Debug, Clone, Copy)]
pub struct TerminalModes {
    keyboard_enhancement: bool,
}

pub fn setup_terminal() -> Result<(SharedTerminal, TerminalModes), Box<dyn Error>> {
    // Must be queried before raw mode changes how the terminal answers.
    let keyboard_enhancement = supports_keyboard_enhancement().unwrap_or(false);
    debug!(keyboard_enhancement, "terminal capabilities");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    // Without this, Ctrl+Shift+<letter> is indistinguishable from
    // Ctrl+<letter>.
    if keyboard_enhancement {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;

    Ok((
        Arc::new(Mutex::new(terminal)),
        TerminalModes {
            keyboard_enhancement,
        },
    ))
}

pub async fn restore_terminal<W>(
    terminal: &SharedTerminal<W>,
    modes: TerminalModes,
) -> Result<(), Box<dyn Error>>
where
    W: Write + Send + 'static,
{
    disable_raw_mode()?;
    let mut guard = terminal.lock().await;
    if modes.keyboard_enhancement {
        execute!(guard.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    execute!(
        guard.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    guard.show_cursor()?;
    Ok(())
}
