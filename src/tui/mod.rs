//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! Two screens live here:
//!
//! - **chat**: the message stream, annotation controls, statement pane and
//!   composer, backed by a [`TaskApi`].
//! - **review**: a host page with one embedded task frame. Both ends of the
//!   frame run in-process and talk only through `core::frame` envelopes.
//!
//! ## Redraw Strategy
//!
//! Nothing animates, so the loop only redraws after terminal events or
//! actions from background tasks. The poll timeout stays short because those
//! actions arrive on a channel the loop checks between polls.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::frame::{self, FrameEndpoint};
use crate::core::review::{ParentFrame, ReviewLoader, ReviewPayload};
use crate::core::size::SizeReporter;
use crate::core::state::{ANNOTATE_FIRST_HINT, App, InputMode, REGENERATING_HINT};
use crate::task::{
    HttpTaskApi, LiveUpdate, LocalAgent, Message, OutboundMessage, StreamUpdate, TaskApi,
};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::review_view::content_height;
use crate::tui::components::{
    ControlEvent, ControlsState, InputBox, InputEvent, MessageListState, ReviewView,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Capacity of the per-request update channel handed to the task API.
const STREAM_BUFFER: usize = 64;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which widget receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Text goes to the composer. Esc or Tab moves to the controls.
    Composer,
    /// Keys drive the annotation and regenerate controls.
    Controls,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub controls: ControlsState,
    pub focus: Focus,
}

impl TuiState {
    pub fn new(option_count: usize) -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            controls: ControlsState::new(option_count),
            focus: Focus::Composer, // Worker expects to type immediately
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Composer => Focus::Controls,
            Focus::Controls => {
                self.controls.reason_draft = None;
                Focus::Composer
            }
        };
    }

    /// Copy the props the components mirror from the core.
    fn sync(&mut self, app: &App) {
        self.input_box.sync(app.composer.text());
        self.input_box.sending = app.composer.is_sending();
        self.input_box.focused = self.focus == Focus::Composer;
        self.input_box.blocked_hint = match app.input_mode {
            InputMode::Done => Some("Task complete: Tab, then d to finish".to_string()),
            InputMode::Waiting => Some("Waiting for a reply…".to_string()),
            InputMode::ReadyForInput if app.annotation_needed() => {
                Some(ANNOTATE_FIRST_HINT.to_string())
            }
            InputMode::ReadyForInput if app.regenerating() => Some(REGENERATING_HINT.to_string()),
            InputMode::ReadyForInput => None,
        };
        self.controls.option_count = app.annotation_options.len();
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is harmlessly ignored by terminals without it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Build the task API for a resolved config.
///
/// With an endpoint this is the HTTP client; without one (or if the client
/// can't be built) it is the offline local agent, which also supplies the
/// opening message.
pub fn build_task_api(config: &ResolvedConfig) -> (Arc<dyn TaskApi>, Option<Message>) {
    if let Some(endpoint) = &config.task_endpoint {
        match HttpTaskApi::new(endpoint.clone(), config.request_timeout) {
            Ok(api) => return (Arc::new(api), None),
            Err(e) => warn!("Task endpoint unusable ({}), falling back to local agent", e),
        }
    }
    let agent = LocalAgent::new(config.local_reply_delay, config.local_max_turns);
    let greeting = agent.greeting();
    (Arc::new(agent), Some(greeting))
}

/// Run one action through the core and carry out its effect.
/// Returns true when the loop should exit.
fn dispatch(app: &mut App, action: Action, tx: &mpsc::Sender<Action>) -> bool {
    match update(app, action) {
        Effect::None => false,
        Effect::Quit => true,
        Effect::SendMessage(message) => {
            spawn_send(app.task_api.clone(), message, tx.clone());
            false
        }
        Effect::SendLiveUpdate(live_update) => {
            spawn_regenerate(app.task_api.clone(), live_update, tx.clone());
            false
        }
    }
}

fn handle_chat_event(
    app: &mut App,
    tui: &mut TuiState,
    event: TuiEvent,
    tx: &mpsc::Sender<Action>,
) -> bool {
    match event {
        // Resize just needs a redraw
        TuiEvent::Resize(..) => false,
        TuiEvent::ForceQuit => dispatch(app, Action::Quit, tx),
        TuiEvent::ToggleFocus => {
            tui.toggle_focus();
            false
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(&event);
            false
        }
        _ => match tui.focus {
            Focus::Composer => {
                if matches!(event, TuiEvent::Escape) {
                    tui.focus = Focus::Controls;
                    return false;
                }
                match tui.input_box.handle_event(&event) {
                    Some(InputEvent::Changed(text)) => {
                        dispatch(app, Action::ComposerChanged(text), tx)
                    }
                    Some(InputEvent::Submit) => {
                        // New messages should be seen, wherever the worker had scrolled
                        tui.message_list.stick_to_bottom = true;
                        dispatch(app, Action::Submit, tx)
                    }
                    None => false,
                }
            }
            Focus::Controls => {
                if matches!(event, TuiEvent::Escape) && !tui.controls.prompt_open() {
                    tui.focus = Focus::Composer;
                    return false;
                }
                match tui.controls.handle_event(&event) {
                    Some(ControlEvent::Annotate(option)) => {
                        let (Some((index, _)), Some(value)) = (
                            app.last_message(),
                            app.annotation_options.get(option).cloned(),
                        ) else {
                            return false;
                        };
                        let quit = dispatch(
                            app,
                            Action::Annotate {
                                index,
                                value: Some(value),
                            },
                            tx,
                        );
                        // The composer now holds the prefilled judgment
                        tui.focus = Focus::Composer;
                        quit
                    }
                    Some(ControlEvent::Regenerate(reason)) => {
                        dispatch(app, Action::Regenerate(reason), tx)
                    }
                    Some(ControlEvent::Done) => dispatch(app, Action::CompleteTask, tx),
                    None => false,
                }
            }
        },
    }
}

pub fn run_chat(config: ResolvedConfig) -> std::io::Result<()> {
    let (task_api, greeting) = build_task_api(&config);
    let mut app = App::from_config(task_api, &config);
    let mut tui = TuiState::new(app.annotation_options.len());

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    if let Some(greeting) = greeting {
        dispatch(&mut app, Action::Stream(StreamUpdate::Append(greeting)), &tx);
    }
    info!(
        "Chat session {} started against task API '{}'",
        app.session_id,
        app.task_api.name()
    );

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let mut needs_redraw = true; // Force first frame

    'main: loop {
        tui.sync(&app);

        if needs_redraw {
            terminal.draw(|f| ui::draw_chat(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        // Process first event + drain ALL pending events before next draw
        let first_event = poll_event_timeout(POLL_INTERVAL);
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_chat_event(&mut app, &mut tui, event, &tx) {
                break 'main;
            }
            // Keep the component's buffer in step between events of one batch
            tui.sync(&app);
        }

        // Handle background task actions (send results, incoming messages)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if dispatch(&mut app, action, &tx) {
                break 'main;
            }
        }
    }

    info!("Chat session {} ended", app.session_id);
    ratatui::restore();
    Ok(())
}

/// Drain a request's update channel while the call is still running, so a
/// reply longer than the channel never stalls the task API.
async fn drain_updates(mut updates: tokio::sync::mpsc::Receiver<StreamUpdate>) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Some(update) = updates.recv().await {
        actions.push(Action::Stream(update));
    }
    debug!("Collected {} stream updates", actions.len());
    actions
}

/// Run a send and return the actions to apply, in order: the outcome first,
/// so the worker's own message is in the stream before the replies to it.
async fn send_and_collect(api: &dyn TaskApi, message: OutboundMessage) -> Vec<Action> {
    let (update_tx, update_rx) = tokio::sync::mpsc::channel(STREAM_BUFFER);
    let (result, updates) = tokio::join!(
        api.on_message_send(message, update_tx),
        drain_updates(update_rx)
    );
    let outcome = match result {
        Ok(()) => Action::SendSucceeded,
        Err(e) => {
            warn!("Message send failed: {}", e);
            Action::SendFailed(e.to_string())
        }
    };
    std::iter::once(outcome).chain(updates).collect()
}

/// Run a regenerate request and return the actions to apply. The
/// replacement comes before the outcome so the control re-arms only once
/// the new message is in place.
async fn regenerate_and_collect(api: &dyn TaskApi, live_update: LiveUpdate) -> Vec<Action> {
    let (update_tx, update_rx) = tokio::sync::mpsc::channel(STREAM_BUFFER);
    let (result, mut actions) = tokio::join!(
        api.send_live_update(live_update, update_tx),
        drain_updates(update_rx)
    );
    actions.push(match result {
        Ok(()) => Action::RegenerateSucceeded,
        Err(e) => {
            warn!("Regeneration request failed: {}", e);
            Action::RegenerateFailed(e.to_string())
        }
    });
    actions
}

fn forward(actions: Vec<Action>, tx: &mpsc::Sender<Action>) {
    for action in actions {
        if tx.send(action).is_err() {
            warn!("Failed to forward action: receiver dropped");
            return;
        }
    }
}

/// Send a message on a background task.
fn spawn_send(api: Arc<dyn TaskApi>, message: OutboundMessage, tx: mpsc::Sender<Action>) {
    info!("Sending message ({} chars) via {}", message.text.len(), api.name());
    tokio::spawn(async move {
        let actions = send_and_collect(api.as_ref(), message).await;
        forward(actions, &tx);
    });
}

fn spawn_regenerate(api: Arc<dyn TaskApi>, live_update: LiveUpdate, tx: mpsc::Sender<Action>) {
    info!("Requesting regeneration via {}", api.name());
    tokio::spawn(async move {
        let actions = regenerate_and_collect(api.as_ref(), live_update).await;
        forward(actions, &tx);
    });
}

/// Width the child frame renders at inside the host page's borders.
fn child_width(terminal_width: u16) -> u16 {
    terminal_width.saturating_sub(2)
}

/// Run the review screen: a host page embedding one task frame.
///
/// The parent posts the payload once on open; the child renders it and
/// reports its height on mount, on every resize and once more after the
/// catch-all delay.
pub fn run_review(config: ResolvedConfig, payload: ReviewPayload) -> std::io::Result<()> {
    let (parent_end, child_end) = frame::channel();
    let FrameEndpoint {
        messenger: parent_messenger,
        inbox: mut parent_inbox,
    } = parent_end;
    let FrameEndpoint {
        messenger: child_messenger,
        inbox: mut child_inbox,
    } = child_end;

    let mut parent = ParentFrame::new(parent_messenger, payload);
    let mut loader = ReviewLoader::new();
    let mut reporter = SizeReporter::new(child_messenger, config.catch_all_delay);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let mut width = child_width(terminal.size()?.width);

    // Child mounts first and reports whatever it shows while loading
    reporter.mount(Instant::now(), content_height(&loader, width));
    if let Err(e) = parent.open() {
        warn!("Failed to post review data to the task frame: {}", e);
    }

    loop {
        let now = Instant::now();

        for envelope in child_inbox.drain() {
            loader.apply(envelope);
        }
        reporter.poll(now, content_height(&loader, width));
        for envelope in parent_inbox.drain() {
            parent.apply(envelope);
        }

        terminal.draw(|f| {
            let area = f.area();
            ReviewView {
                loader: &loader,
                reported_height: parent.child_height(),
                catch_all_pending: reporter.pending_catch_all(now).is_some(),
            }
            .render(f, area);
        })?;

        let mut should_quit = false;
        for event in poll_event_timeout(POLL_INTERVAL)
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::ForceQuit | TuiEvent::Escape | TuiEvent::InputChar('q') => {
                    should_quit = true;
                }
                TuiEvent::Resize(w, _) => {
                    width = child_width(w);
                    reporter.resize(content_height(&loader, width));
                }
                _ => {}
            }
        }
        if should_quit {
            break;
        }
    }

    reporter.unmount();
    info!("Review screen closed");
    ratatui::restore();
    Ok(())
}
