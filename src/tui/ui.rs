use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::controls::shows_controls;
use crate::tui::components::{ControlsBar, MessageList, StatementPane, TitleBar};
use crate::tui::{Focus, TuiState};

/// Share of the body width given to the statement pane when it has documents.
const STATEMENT_PANE_PERCENT: u16 = 32;

pub fn draw_chat(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min, Percentage};

    let views = app.views();
    let controls = views
        .last()
        .and_then(|v| v.controls.as_ref())
        .filter(|c| shows_controls(c));

    let area = frame.area();
    let controls_height = tui.controls.calculate_height(controls);
    let input_height = tui.input_box.calculate_height(area.width);
    let [title_area, body_area, controls_area, input_area] = Layout::vertical([
        Length(1),
        Min(0),
        Length(controls_height),
        Length(input_height),
    ])
    .areas(area);

    let documents = app.statements.documents();
    let (messages_area, statements_area) = if documents.is_empty() {
        (body_area, None)
    } else {
        let [left, right] = Layout::horizontal([
            Percentage(100 - STATEMENT_PANE_PERCENT),
            Percentage(STATEMENT_PANE_PERCENT),
        ])
        .areas(body_area);
        (left, Some(right))
    };

    let focused_controls = tui.focus == Focus::Controls;
    let selected = (focused_controls && controls.is_some()).then(|| views.len() - 1);
    MessageList::new(&mut tui.message_list, &views, selected).render(frame, messages_area);

    if let Some(statements_area) = statements_area {
        StatementPane { documents }.render(frame, statements_area);
    }

    if let Some(controls) = controls {
        ControlsBar {
            state: &tui.controls,
            controls,
            options: &app.annotation_options,
            focused: focused_controls,
        }
        .render(frame, controls_area);
    }

    tui.input_box.render(frame, input_area);

    // Title last: the unseen marker depends on this frame's scroll state
    TitleBar {
        agent_name: app.agents.display_name(&app.agents.agent_id),
        gating: app.policy.label(),
        status_message: &app.status_message,
        has_unseen_content: tui.message_list.has_unseen_content(),
    }
    .render(frame, title_area);
}
