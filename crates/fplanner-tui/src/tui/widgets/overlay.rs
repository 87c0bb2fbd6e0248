// Modal overlays: the quit confirmation and the numeric input prompt.
//
// Rendered on top of the main layout; `Clear` wipes the area first.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::Prompt;

const QUIT_WIDTH: u16 = 28;
const QUIT_HEIGHT: u16 = 5;
const PROMPT_WIDTH: u16 = 40;
const PROMPT_HEIGHT: u16 = 3;

/// Render the quit confirmation overlay centered on the screen.
pub fn render_quit(frame: &mut Frame, area: Rect) {
    let dialog_area = centered_rect(QUIT_WIDTH, QUIT_HEIGHT, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            " Quit? ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));

    let text = Line::from(vec![
        Span::raw("  Really quit? ("),
        Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("/"),
        Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(")"),
    ]);

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}

/// Render a one-line input box titled after the prompt, with a block cursor
/// after the typed digits.
pub fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt, input: &str) {
    let dialog_area = centered_rect(PROMPT_WIDTH, PROMPT_HEIGHT, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} ", prompt.title()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let text = Line::from(vec![
        Span::styled(format!(" {input}"), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::Gray)),
    ]);

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}

/// Compute a centered rectangle of the given size within `area`, clamped to
/// the available space.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
