//! Event polling, dispatching, and UI rendering loop.
//!
//! Every iteration draws if a redraw is due, then drains terminal events,
//! stream messages and queued actions, and finally fires whatever timers
//! are due (reveal ticks and the side chat's intro). There is no timer task:
//! when nothing happens the loop sleeps until the next deadline or frame.

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::layout::Size;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::core::app::{
    apply_actions, poll_deadlines, App, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand, SessionContext,
};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::chord::KeyChord;
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

use super::keybindings::{build_mode_aware_registry, KeyContext, KeyResult, ModeAwareRegistry};
use super::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use super::mouse::mouse_action;
use super::AppHandle;

const MAX_FPS: u64 = 60;
/// How often the streaming indicator is redrawn.
const INDICATOR_FRAME: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

async fn is_exit_requested(app: &AppHandle) -> bool {
    app.read(|app| app.ui.exit_requested).await
}

async fn current_terminal_size(terminal: &SharedTerminal) -> Size {
    let terminal_guard = terminal.lock().await;
    terminal_guard.size().unwrap_or_default()
}

async fn try_draw_frame(
    app: &AppHandle,
    terminal: &SharedTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut terminal_guard = terminal.lock().await;
    app.update(|app| terminal_guard.draw(|f| ui(f, app)).map(|_| ()))
        .await?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

struct EventProcessingOutcome {
    events_processed: bool,
    exit_requested: bool,
}

fn action_context(term_size: Size) -> AppActionContext {
    AppActionContext {
        term_width: term_size.width,
        term_height: term_size.height,
    }
}

async fn process_ui_events(
    app: &AppHandle,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    mode_registry: &ModeAwareRegistry,
    dispatcher: &AppActionDispatcher,
    explain_chord: KeyChord,
    term_size: Size,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        exit_requested: false,
    };
    let ctx = action_context(term_size);

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                let result =
                    route_keyboard_event(app, mode_registry, dispatcher, explain_chord, key, ctx)
                        .await;
                if result == KeyResult::Exit {
                    outcome.exit_requested = true;
                    break;
                }
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                handle_paste_event(dispatcher, ctx, &text);
            }
            UiEvent::Crossterm(Event::Mouse(mouse)) => {
                let pointer_held = app
                    .read(|app| {
                        app.ui.selecting || app.side.get().is_some_and(|side| side.is_dragging())
                    })
                    .await;
                if let Some(action) = mouse_action(mouse, pointer_held) {
                    dispatcher.dispatch_many([action], ctx);
                }
            }
            UiEvent::Crossterm(Event::FocusLost) => {
                dispatcher.dispatch_many([AppAction::PointerLost], ctx);
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    outcome
}

async fn route_keyboard_event(
    app: &AppHandle,
    mode_registry: &ModeAwareRegistry,
    dispatcher: &AppActionDispatcher,
    explain_chord: KeyChord,
    key: KeyEvent,
    ctx: AppActionContext,
) -> KeyResult {
    // The chord never reaches an input, whichever has focus.
    if explain_chord.matches(&key) {
        dispatcher.dispatch_many([AppAction::ToggleSideChat], ctx);
        return KeyResult::Handled;
    }

    if mode_registry.should_handle_as_text_input(&key) {
        forward_to_input(app, key).await;
        return KeyResult::Handled;
    }

    let context = app
        .read(|app| KeyContext::from_focus(app.ui.focus, app.side.is_open()))
        .await;
    match mode_registry
        .handle_key_event(app, dispatcher, &key, context, ctx)
        .await
    {
        KeyResult::NotHandled => {
            forward_to_input(app, key).await;
            KeyResult::Handled
        }
        result => result,
    }
}

async fn forward_to_input(app: &AppHandle, key: KeyEvent) {
    app.update(|app| {
        app.focused_input_mut().input(tui_textarea::Input::from(key));
    })
    .await;
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

fn handle_paste_event(dispatcher: &AppActionDispatcher, ctx: AppActionContext, text: &str) {
    let sanitized_text = sanitize_pasted_text(text);
    if sanitized_text.is_empty() {
        return;
    }
    dispatcher.dispatch_many(
        [AppAction::InsertIntoInput {
            text: sanitized_text,
        }],
        ctx,
    );
}

/// Forward stream messages as actions, merging consecutive chunks of the
/// same stream. Messages for streams nobody listens to any more are
/// discarded later, when the action is applied.
fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    ctx: AppActionContext,
) -> bool {
    let mut actions = Vec::new();
    let mut pending_chunk: Option<(String, u64)> = None;

    while let Ok((message, stream_id)) = rx.try_recv() {
        if let StreamMessage::Delta(content) = message {
            match pending_chunk.as_mut() {
                Some((buffer, id)) if *id == stream_id => buffer.push_str(&content),
                _ => {
                    flush_chunk(&mut actions, pending_chunk.take());
                    pending_chunk = Some((content, stream_id));
                }
            }
            continue;
        }

        flush_chunk(&mut actions, pending_chunk.take());
        actions.push(match message {
            StreamMessage::Done {
                finish_reason,
                usage,
            } => AppAction::StreamCompleted {
                finish_reason,
                usage,
                stream_id,
            },
            StreamMessage::Error(message) => AppAction::StreamErrored { message, stream_id },
            StreamMessage::Delta(_) => unreachable!("deltas are buffered above"),
        });
    }
    flush_chunk(&mut actions, pending_chunk);

    if actions.is_empty() {
        return false;
    }
    dispatcher.dispatch_many(actions, ctx);
    true
}

fn flush_chunk(actions: &mut Vec<AppAction>, chunk: Option<(String, u64)>) {
    if let Some((content, stream_id)) = chunk.filter(|(content, _)| !content.is_empty()) {
        actions.push(AppAction::AppendResponseChunk { content, stream_id });
    }
}

fn run_commands(stream_service: &ChatStreamService, commands: Vec<AppCommand>) {
    for cmd in commands {
        match cmd {
            AppCommand::SpawnStream(params) => stream_service.spawn_stream(params),
        }
    }
}

async fn drain_action_queue(
    app: &AppHandle,
    stream_service: &ChatStreamService,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let commands = app.update(|app| apply_actions(app, pending)).await;
    run_commands(stream_service, commands);
    true
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// How long the loop may sleep when idle: until the next frame, or sooner
/// when a timer is due.
fn idle_sleep(next_deadline: Option<Instant>, now: Instant, frame_duration: Duration) -> Duration {
    next_deadline
        .map(|deadline| deadline.saturating_duration_since(now))
        .map_or(frame_duration, |until| until.min(frame_duration))
}

pub async fn run_chat(session: SessionContext, theme: Theme) -> Result<(), Box<dyn Error>> {
    info!(model = %session.model, base_url = %session.base_url, "starting chat session");
    let explain_chord = session.explain_chord;
    let app = AppHandle::new(Arc::new(Mutex::new(App::new(session, theme))));

    let (terminal, modes) = setup_terminal()?;
    let result = run_event_loop(&app, &terminal, explain_chord).await;
    restore_terminal(&terminal, modes).await?;

    info!("chat session ended");
    result
}

async fn run_event_loop(
    app: &AppHandle,
    terminal: &SharedTerminal,
    explain_chord: KeyChord,
) -> Result<(), Box<dyn Error>> {
    let (stream_service, mut stream_rx) = ChatStreamService::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);
    let mode_registry = build_mode_aware_registry();

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut last_indicator_frame = Instant::now();

    let result = 'main_loop: loop {
        if is_exit_requested(app).await {
            break 'main_loop Ok(());
        }

        if let Err(err) = try_draw_frame(
            app,
            terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await
        {
            break 'main_loop Err(err.into());
        }

        let term_size = current_terminal_size(terminal).await;
        let size_changed = app
            .update(|app| {
                let changed = app.ui.last_term_size != term_size;
                app.ui.last_term_size = term_size;
                changed
            })
            .await;
        if size_changed {
            request_redraw = true;
        }

        let event_outcome = process_ui_events(
            app,
            &mut event_rx,
            &mode_registry,
            &dispatcher,
            explain_chord,
            term_size,
        )
        .await;
        if event_outcome.exit_requested {
            break 'main_loop Ok(());
        }
        if event_outcome.events_processed {
            request_redraw = true;
        }

        let received_any =
            process_stream_updates(&dispatcher, &mut stream_rx, action_context(term_size));
        if received_any {
            request_redraw = true;
        }

        if drain_action_queue(app, &stream_service, &mut action_rx).await {
            request_redraw = true;
        }

        let now = Instant::now();
        let (commands, changed) = app.update(|app| poll_deadlines(app, now)).await;
        if !commands.is_empty() {
            debug!(count = commands.len(), "timer commands due");
        }
        run_commands(&stream_service, commands);
        if changed {
            request_redraw = true;
        }

        let (streaming, next_deadline) = app
            .read(|app| (app.is_streaming(), app.next_deadline()))
            .await;
        if streaming && now.duration_since(last_indicator_frame) >= INDICATOR_FRAME {
            request_redraw = true;
            last_indicator_frame = now;
        }

        let idle = !event_outcome.events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(idle_sleep(next_deadline, Instant::now(), frame_duration)).await;
        } else {
            tokio::task::yield_now().await;
        }
    };

    event_reader_handle.abort();
    result
}
