//! Plain-text rendering of session updates

use askdesk_core::{ChatMessage, Sender, SessionUpdate};

/// Default wrap width for chat replies
pub const DEFAULT_WIDTH: usize = 80;

/// Where a rendered line should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Answer text, printed to stdout
    Out(String),
    /// Error banner, printed to stderr
    Err(String),
}

/// Render one update, or `None` if the terminal has nothing to show for it
///
/// User messages are not echoed; the user just typed them.
pub fn render_update(update: &SessionUpdate, width: usize) -> Option<Line> {
    match update {
        SessionUpdate::Error { error: Some(error) } => Some(Line::Err(error.clone())),
        SessionUpdate::MessageAppended { message } if message.sender == Sender::Agent => {
            Some(render_agent_message(message, width))
        }
        SessionUpdate::ResponseUpdated { display } => Some(Line::Out(display.clone())),
        _ => None,
    }
}

fn render_agent_message(message: &ChatMessage, width: usize) -> Line {
    let mut text = textwrap::fill(&message.text, width.max(1));
    if let Some(count) = message.source_count {
        let noun = if count == 1 { "source" } else { "sources" };
        text.push_str(&format!("\n({count} {noun})"));
    }

    if message.is_error() {
        Line::Err(text)
    } else {
        Line::Out(text)
    }
}
