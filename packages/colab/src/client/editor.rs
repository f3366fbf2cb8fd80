use edit_core::{Document, Edit, EditOp};

use super::keymap::{KeyAction, Motion};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

/// Result of feeding one key action to the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The edit was applied to the local copy and must go to the server.
    Send(Edit),
    /// Only local state (or nothing) changed.
    Local,
    Quit,
}

/// The client's local copy of the document plus its cursor.
///
/// Edits are built from the cursor position *before* the key is applied,
/// exactly what the server needs to replay them.
#[derive(Clone, Debug, Default)]
pub struct LocalEditor {
    document: Document,
    cursor: Cursor,
}

impl LocalEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn handle(&mut self, action: KeyAction) -> Step {
        let Cursor { row, col } = self.cursor;
        let edit = match action {
            KeyAction::Insert(ch) => Edit::insert(ch, row, col),
            KeyAction::Newline => Edit::insert('\n', row, col),
            KeyAction::Backspace => Edit::delete(row, col),
            KeyAction::Move(motion) => {
                self.move_cursor(motion);
                return Step::Local;
            }
            KeyAction::Quit => return Step::Quit,
            KeyAction::PassThrough => return Step::Local,
        };
        self.apply_local(&edit);
        Step::Send(edit)
    }

    fn apply_local(&mut self, edit: &Edit) {
        let Cursor { row, col } = self.cursor;
        let col = col.min(self.document.line_len(row));
        let next = match edit.op {
            EditOp::Insert('\n' | '\r') => Cursor { row: row + 1, col: 0 },
            EditOp::Insert(_) => Cursor { row, col: col + 1 },
            EditOp::Delete if col > 0 => Cursor { row, col: col - 1 },
            EditOp::Delete if row > 0 => Cursor {
                row: row - 1,
                col: self.document.line_len(row - 1),
            },
            EditOp::Delete => Cursor { row, col },
        };
        self.document.apply(edit);
        self.cursor = next;
    }

    fn move_cursor(&mut self, motion: Motion) {
        let Cursor { row, col } = self.cursor;
        let last_row = self.document.line_count().saturating_sub(1);
        self.cursor = match motion {
            Motion::Left if col > 0 => Cursor { row, col: col - 1 },
            Motion::Left if row > 0 => Cursor {
                row: row - 1,
                col: self.document.line_len(row - 1),
            },
            Motion::Right if col < self.document.line_len(row) => Cursor { row, col: col + 1 },
            Motion::Right if row < last_row => Cursor { row: row + 1, col: 0 },
            Motion::Up if row > 0 => Cursor { row: row - 1, col },
            Motion::Down if row < last_row => Cursor { row: row + 1, col },
            Motion::Home => Cursor { row, col: 0 },
            Motion::End => Cursor {
                row,
                col: self.document.line_len(row),
            },
            _ => self.cursor,
        };
        let len = self.document.line_len(self.cursor.row);
        self.cursor.col = self.cursor.col.min(len);
    }
}
