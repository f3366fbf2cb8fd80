use crate::edit::{Edit, EditOp};

/// Result of applying one edit to a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Dropped(DropReason),
}

/// Why an edit left the document untouched.
///
/// None of these are errors: stale edits that no longer fit the document are
/// dropped silently and only show up in debug logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// `row` is not an index into the current lines.
    RowOutOfRange { row: usize, line_count: usize },
    /// Delete at `(0, 0)`: nothing precedes the start of the document.
    StartOfDocument,
    /// Delete with `col > 0` on an empty line.
    NothingToDelete,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowOutOfRange { row, line_count } => {
                write!(f, "row {} out of range ({} lines)", row, line_count)
            }
            Self::StartOfDocument => write!(f, "delete at start of document"),
            Self::NothingToDelete => write!(f, "nothing to delete on empty line"),
        }
    }
}

/// Line-oriented text. Always holds at least one (possibly empty) line and no
/// line ever contains a line terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a single empty line.
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    /// Split `text` into lines. `\r\n`, `\n` and a lone `\r` each end a line.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .replace("\r\n", "\n")
            .split(['\n', '\r'])
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::from_text(&joined)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length of `row` in code points, 0 for rows that don't exist.
    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |line| line.chars().count())
    }

    /// Total code points across all lines, terminators excluded.
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|line| line.chars().count()).sum()
    }

    /// Full text with lines joined by `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Apply one edit.
    ///
    /// Columns past the end of a line are clamped to the end of that line.
    pub fn apply(&mut self, edit: &Edit) -> ApplyOutcome {
        let Edit { op, row, col } = *edit;
        let line_count = self.lines.len();
        if row >= line_count {
            return ApplyOutcome::Dropped(DropReason::RowOutOfRange { row, line_count });
        }

        match op {
            EditOp::Insert(ch) if is_line_break(ch) => {
                let line = &mut self.lines[row];
                let at = byte_offset(line, col);
                let after = line.split_off(at);
                self.lines.insert(row + 1, after);
            }
            EditOp::Insert(ch) => {
                let line = &mut self.lines[row];
                let at = byte_offset(line, col);
                line.insert(at, ch);
            }
            EditOp::Delete if col > 0 => {
                let line = &mut self.lines[row];
                let end = byte_offset(line, col);
                let Some(prev) = line[..end].chars().next_back() else {
                    return ApplyOutcome::Dropped(DropReason::NothingToDelete);
                };
                line.remove(end - prev.len_utf8());
            }
            EditOp::Delete if row > 0 => {
                let current = self.lines.remove(row);
                self.lines[row - 1].push_str(&current);
            }
            EditOp::Delete => return ApplyOutcome::Dropped(DropReason::StartOfDocument),
        }

        ApplyOutcome::Applied
    }
}

fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// Byte index of code point `col`, clamped to the end of the line.
fn byte_offset(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map_or(line.len(), |(index, _)| index)
}
