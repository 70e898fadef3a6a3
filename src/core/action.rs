//! # Actions
//!
//! Everything that can happen in a chat-review session becomes an `Action`.
//! Worker picks a radio option? That's `Action::Annotate`.
//! Task server answers? That's `Action::Stream(StreamUpdate::Append(..))`.
//!
//! `update()` applies an action to the state and returns the side effect the
//! caller should run. No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! `update()` is also the only writer of the annotation store.

use log::{debug, info, warn};

use crate::core::annotation::AnnotationAction;
use crate::core::state::{ANNOTATE_FIRST_HINT, App, InputMode, REGENERATING_HINT};
use crate::task::{LiveUpdate, Message, OutboundMessage, StreamUpdate, TASK_DONE_KEY};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A message arrived (or replaced the last one).
    Stream(StreamUpdate),
    /// Record a judgment for the message at `index`.
    Annotate { index: usize, value: Option<String> },
    ComposerChanged(String),
    Submit,
    SendSucceeded,
    SendFailed(String),
    /// Ask for the last message to be replaced, with a reason.
    Regenerate(String),
    RegenerateSucceeded,
    RegenerateFailed(String),
    SetInputMode(InputMode),
    CompleteTask,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SendMessage(OutboundMessage),
    SendLiveUpdate(LiveUpdate),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Stream(StreamUpdate::Append(message)) => {
            append(app, message);
            Effect::None
        }
        Action::Stream(StreamUpdate::ReplaceLast(message)) => {
            replace_last(app, message);
            Effect::None
        }
        Action::Annotate { index, value } => {
            let Some(message) = app.messages.get(index) else {
                warn!(
                    "Ignoring annotation for index {} (stream has {} messages)",
                    index,
                    app.messages.len()
                );
                return Effect::None;
            };
            if message.text.is_empty() {
                warn!("Ignoring annotation for hidden message {}", index);
                return Effect::None;
            }
            let previous_seed = app.annotations.get(index).flatten().map(prefill_text);
            app.annotations.dispatch(AnnotationAction {
                index,
                value: value.clone(),
            });
            if index + 1 == app.messages.len()
                && let Some(value) = value
            {
                app.composer
                    .prefill(prefill_text(&value), previous_seed.as_deref());
            }
            app.status_message = format!("Annotated message {}", index + 1);
            Effect::None
        }
        Action::ComposerChanged(text) => {
            app.composer.edit(text);
            Effect::None
        }
        Action::Submit => {
            let allowed = app.can_send();
            match app.composer.submit(allowed) {
                Some(text) => {
                    info!("Submitting message ({} chars)", text.len());
                    app.status_message = "Sending...".to_string();
                    Effect::SendMessage(OutboundMessage::new(text))
                }
                None => {
                    if app.annotation_needed() {
                        app.status_message = ANNOTATE_FIRST_HINT.to_string();
                    } else if app.regenerating() {
                        app.status_message = REGENERATING_HINT.to_string();
                    }
                    Effect::None
                }
            }
        }
        Action::SendSucceeded => {
            let text = app.composer.text().to_string();
            if app.composer.is_sending() {
                let update_id = app.next_local_update_id;
                app.next_local_update_id += 1;
                let own = Message::new(app.agents.agent_id.clone(), update_id, text);
                app.messages.push(own);
                app.composer.sent();
                app.input_mode = InputMode::Waiting;
                app.sync_derived();
                app.status_message = "Waiting for a reply...".to_string();
            }
            Effect::None
        }
        Action::SendFailed(error) => {
            warn!("Send failed: {}", error);
            app.composer.failed();
            app.status_message = format!("Send failed: {}", error);
            Effect::None
        }
        Action::Regenerate(reason) => {
            if !app.can_regenerate() {
                debug!("Regenerate ignored: control not available");
                return Effect::None;
            }
            let Some((_, last)) = app.last_message() else {
                return Effect::None;
            };
            let update_id = last.update_id;
            match app.regeneration.fire(reason) {
                Some(request) => {
                    app.status_message = "Regenerating...".to_string();
                    Effect::SendLiveUpdate(LiveUpdate::regenerate(update_id, request.reason))
                }
                None => Effect::None,
            }
        }
        Action::RegenerateSucceeded => {
            app.regeneration.succeed();
            Effect::None
        }
        Action::RegenerateFailed(error) => {
            app.regeneration.fail(&error);
            app.status_message = format!("Regenerate failed: {}", error);
            Effect::None
        }
        Action::SetInputMode(mode) => {
            app.input_mode = mode;
            Effect::None
        }
        Action::CompleteTask => {
            if app.input_mode == InputMode::Done {
                info!("Task completed by worker");
                Effect::Quit
            } else {
                Effect::None
            }
        }
        Action::Quit => Effect::Quit,
    }
}

fn append(app: &mut App, message: Message) {
    debug!(
        "Appending message from {} (update_id {})",
        message.id, message.update_id
    );
    app.messages.push(message);
    after_incoming(app);
}

/// Replace the last message, but only with the answer to the regenerate
/// request currently awaited for it. Anything else is stale and dropped.
fn replace_last(app: &mut App, message: Message) {
    let Some((index, last)) = app.last_message() else {
        warn!(
            "Dropping replacement (update_id {}): stream is empty",
            message.update_id
        );
        return;
    };
    let key = last.render_key(index);
    if app.regeneration.awaiting() != Some(key.as_str()) {
        warn!(
            "Dropping replacement (update_id {}): no regenerate pending for {}",
            message.update_id, key
        );
        return;
    }
    debug!(
        "Replacing last message (update_id {} → {})",
        last.update_id, message.update_id
    );
    app.messages[index] = message;
    app.regeneration.superseded();
    app.statements.invalidate();
    after_incoming(app);
}

fn prefill_text(value: &str) -> String {
    format!("{} - ", value)
}

fn after_incoming(app: &mut App) {
    if let Some((_, last)) = app.last_message() {
        let done = last
            .task_data
            .get(TASK_DONE_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if done {
            app.input_mode = InputMode::Done;
            app.status_message = "Thanks for completing the task!".to_string();
        } else if !app.agents.is_self(&last.id) {
            app.input_mode = InputMode::ReadyForInput;
            app.status_message = "New message".to_string();
        }
    }
    app.sync_derived();
}
