//! Client screen: the local document in a bordered block, cursor placed at
//! the local caret.

use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::editor::{Cursor, LocalEditor};

pub const TITLE: &str = " Collaborative Editor (Client) ";
const HELP: &str = " type to edit · ←↑↓→ move · ctrl-c quit ";

pub fn draw(frame: &mut Frame, editor: &LocalEditor, status: &str) {
    let area = frame.area();
    let block = Block::default()
        .title(TITLE)
        .title_bottom(Line::raw(HELP))
        .title_bottom(
            Line::styled(
                format!(" {status} "),
                Style::default().add_modifier(Modifier::DIM),
            )
            .right_aligned(),
        )
        .borders(Borders::ALL);
    let inner = block.inner(area);

    let cursor = editor.cursor();
    let caret_x = caret_column(editor);
    let (row_off, x_off) = viewport(cursor.row, caret_x, inner);
    let lines: Vec<Line> = editor
        .document()
        .lines()
        .iter()
        .skip(row_off)
        .take(inner.height as usize)
        .map(|line| Line::raw(line.as_str()))
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((0, u16::try_from(x_off).unwrap_or(u16::MAX)));
    frame.render_widget(paragraph, area);

    if inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position(Position::new(
            inner.x + (caret_x - x_off) as u16,
            inner.y + (cursor.row - row_off) as u16,
        ));
    }
}

/// Display column of the caret: wide characters take two cells.
fn caret_column(editor: &LocalEditor) -> usize {
    let Cursor { row, col } = editor.cursor();
    let line = editor.document().line(row).unwrap_or_default();
    Span::raw(line.chars().take(col).collect::<String>()).width()
}

/// First visible row and display column such that the caret at (`row`,
/// `x`) lands inside `inner`.
pub(crate) fn viewport(row: usize, x: usize, inner: Rect) -> (usize, usize) {
    let height = (inner.height as usize).max(1);
    let width = (inner.width as usize).max(1);
    (row.saturating_sub(height - 1), x.saturating_sub(width - 1))
}
