use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Byte that terminates every frame on the wire.
pub const FRAME_DELIMITER: u8 = b'\n';

/// What an edit does at its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditOp {
    /// Place a character before the column. `'\n'` splits the line.
    Insert(char),
    /// Remove the character immediately before the column.
    Delete,
}

/// A single positional edit, as typed by a user at `(row, col)`.
///
/// Rows and columns are zero-based; columns count Unicode scalar values, not
/// bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edit {
    pub op: EditOp,
    pub row: usize,
    pub col: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireOp {
    Insert,
    Delete,
}

/// Field-tagged wire shape: `{"op":"insert","char":97,"row":0,"col":3}`.
///
/// `char` is a numeric code point, so a newline travels as `10` and never as a
/// raw delimiter byte.
#[derive(Debug, Serialize, Deserialize)]
struct WireEdit {
    op: WireOp,
    #[serde(rename = "char", default)]
    code_point: Option<u32>,
    row: usize,
    col: usize,
}

impl Edit {
    pub const fn insert(ch: char, row: usize, col: usize) -> Self {
        Self {
            op: EditOp::Insert(ch),
            row,
            col,
        }
    }

    pub const fn delete(row: usize, col: usize) -> Self {
        Self {
            op: EditOp::Delete,
            row,
            col,
        }
    }

    /// Encode as one wire frame, delimiter included.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let wire = WireEdit::from(*self);
        let mut bytes = serde_json::to_vec(&wire)?;
        bytes.push(FRAME_DELIMITER);
        Ok(bytes)
    }

    /// Decode one frame. The trailing delimiter (and a `\r` before it) is
    /// optional.
    pub fn decode(frame: &[u8]) -> Result<Self, CodecError> {
        let payload = strip_delimiter(frame);
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Err(CodecError::Empty);
        }
        let wire: WireEdit = serde_json::from_slice(payload)?;
        Self::try_from(wire)
    }
}

fn strip_delimiter(frame: &[u8]) -> &[u8] {
    let frame = frame.strip_suffix(&[FRAME_DELIMITER]).unwrap_or(frame);
    frame.strip_suffix(b"\r").unwrap_or(frame)
}

impl From<Edit> for WireEdit {
    fn from(edit: Edit) -> Self {
        let (op, code_point) = match edit.op {
            EditOp::Insert(ch) => (WireOp::Insert, ch as u32),
            EditOp::Delete => (WireOp::Delete, 0),
        };
        Self {
            op,
            code_point: Some(code_point),
            row: edit.row,
            col: edit.col,
        }
    }
}

impl TryFrom<WireEdit> for Edit {
    type Error = CodecError;

    fn try_from(wire: WireEdit) -> Result<Self, Self::Error> {
        let op = match wire.op {
            WireOp::Insert => {
                let code_point = wire.code_point.ok_or(CodecError::MissingChar)?;
                let ch = char::from_u32(code_point).ok_or(CodecError::InvalidChar(code_point))?;
                EditOp::Insert(ch)
            }
            // The character is meaningless for delete, whatever was sent.
            WireOp::Delete => EditOp::Delete,
        };
        Ok(Self {
            op,
            row: wire.row,
            col: wire.col,
        })
    }
}

impl std::fmt::Display for Edit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.op {
            EditOp::Insert(ch) => write!(f, "insert {:?} at {}:{}", ch, self.row, self.col),
            EditOp::Delete => write!(f, "delete at {}:{}", self.row, self.col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_field_tagged_json_with_delimiter() {
        let bytes = Edit::insert('a', 2, 7).encode().unwrap();
        assert_eq!(bytes, b"{\"op\":\"insert\",\"char\":97,\"row\":2,\"col\":7}\n");
    }

    #[test]
    fn delete_encodes_zero_char() {
        let bytes = Edit::delete(0, 3).encode().unwrap();
        assert_eq!(bytes, b"{\"op\":\"delete\",\"char\":0,\"row\":0,\"col\":3}\n");
    }

    #[test]
    fn newline_never_appears_inside_payload() {
        let bytes = Edit::insert('\n', 0, 0).encode().unwrap();
        let newlines = bytes.iter().filter(|&&b| b == FRAME_DELIMITER).count();
        assert_eq!(newlines, 1);
        assert_eq!(bytes.last(), Some(&FRAME_DELIMITER));
        assert_eq!(Edit::decode(&bytes).unwrap(), Edit::insert('\n', 0, 0));
    }

    #[test]
    fn decodes_without_delimiter_and_with_crlf() {
        let edit = Edit::decode(br#"{"op":"insert","char":120,"row":1,"col":0}"#).unwrap();
        assert_eq!(edit, Edit::insert('x', 1, 0));

        let edit = Edit::decode(b"{\"op\":\"delete\",\"row\":4,\"col\":1}\r\n").unwrap();
        assert_eq!(edit, Edit::delete(4, 1));
    }

    #[test]
    fn decodes_non_ascii_code_points() {
        let edit = Edit::decode(br#"{"op":"insert","char":128512,"row":0,"col":0}"#).unwrap();
        assert_eq!(edit.op, EditOp::Insert('😀'));
    }

    #[test]
    fn delete_ignores_char_value() {
        let edit = Edit::decode(br#"{"op":"delete","char":55296,"row":0,"col":1}"#).unwrap();
        assert_eq!(edit, Edit::delete(0, 1));
    }

    #[test]
    fn unknown_op_is_malformed() {
        let err = Edit::decode(br#"{"op":"replace","char":97,"row":0,"col":0}"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn negative_row_is_malformed() {
        let err = Edit::decode(br#"{"op":"insert","char":97,"row":-1,"col":0}"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let err = Edit::decode(br#"{"op":"insert","char":97,"ro"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn insert_requires_valid_char() {
        let err = Edit::decode(br#"{"op":"insert","row":0,"col":0}"#).unwrap_err();
        assert!(matches!(err, CodecError::MissingChar));

        let err = Edit::decode(br#"{"op":"insert","char":55296,"row":0,"col":0}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidChar(0xd800)));
    }

    #[test]
    fn blank_frame_is_empty() {
        assert!(matches!(Edit::decode(b"\n"), Err(CodecError::Empty)));
        assert!(matches!(Edit::decode(b"  \r\n"), Err(CodecError::Empty)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let edit =
            Edit::decode(br#"{"op":"insert","char":98,"row":0,"col":0,"user":"x"}"#).unwrap();
        assert_eq!(edit, Edit::insert('b', 0, 0));
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(Edit::insert('a', 1, 2).to_string(), "insert 'a' at 1:2");
        assert_eq!(Edit::delete(3, 0).to_string(), "delete at 3:0");
    }
}
