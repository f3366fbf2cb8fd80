use proptest::prelude::*;
use proptest::sample::Index;

use edit_core::{ApplyOutcome, BufferEngine, CodecError, Document, Edit, EditOp, NullView};

fn arb_document() -> impl Strategy<Value = Document> {
    prop::collection::vec("[a-zA-Z0-9 é😀]{0,8}", 1..6).prop_map(Document::from_lines)
}

fn arb_char() -> impl Strategy<Value = char> {
    any::<char>().prop_filter("line breaks split lines", |c| *c != '\n' && *c != '\r')
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<char>(), 0usize..8, 0usize..12).prop_map(|(ch, row, col)| Edit::insert(ch, row, col)),
        (0usize..8, 0usize..12).prop_map(|(row, col)| Edit::delete(row, col)),
    ]
}

/// Pick a valid (row, col) in `doc`, col in `0..=line_len`.
fn position(doc: &Document, row: Index, col: Index) -> (usize, usize) {
    let row = row.index(doc.line_count());
    let col = col.index(doc.line_len(row) + 1);
    (row, col)
}

// --- Inverse operations ---

proptest! {
    #[test]
    fn insert_then_backspace_restores(doc in arb_document(), ch in arb_char(), r in any::<Index>(), c in any::<Index>()) {
        let (row, col) = position(&doc, r, c);
        let mut edited = doc.clone();
        prop_assert_eq!(edited.apply(&Edit::insert(ch, row, col)), ApplyOutcome::Applied);
        prop_assert_eq!(edited.apply(&Edit::delete(row, col + 1)), ApplyOutcome::Applied);
        prop_assert_eq!(edited, doc);
    }

    #[test]
    fn newline_then_backspace_restores(doc in arb_document(), r in any::<Index>(), c in any::<Index>()) {
        let (row, col) = position(&doc, r, c);
        let mut edited = doc.clone();
        edited.apply(&Edit::insert('\n', row, col));
        edited.apply(&Edit::delete(row + 1, 0));
        prop_assert_eq!(edited, doc);
    }
}

// --- Line structure ---

proptest! {
    #[test]
    fn newline_adds_one_line_and_keeps_content(doc in arb_document(), r in any::<Index>(), c in any::<Index>()) {
        let (row, col) = position(&doc, r, c);
        let mut edited = doc.clone();
        edited.apply(&Edit::insert('\n', row, col));
        prop_assert_eq!(edited.line_count(), doc.line_count() + 1);
        prop_assert_eq!(edited.lines().concat(), doc.lines().concat());
    }

    #[test]
    fn delete_at_line_start_merges(doc in arb_document(), r in any::<Index>()) {
        prop_assume!(doc.line_count() > 1);
        let row = 1 + r.index(doc.line_count() - 1);
        let mut edited = doc.clone();
        edited.apply(&Edit::delete(row, 0));
        prop_assert_eq!(edited.line_count(), doc.line_count() - 1);
        let expected = format!("{}{}", doc.lines()[row - 1], doc.lines()[row]);
        prop_assert_eq!(&edited.lines()[row - 1], &expected);
    }

    #[test]
    fn delete_at_origin_is_noop(doc in arb_document()) {
        let mut edited = doc.clone();
        edited.apply(&Edit::delete(0, 0));
        prop_assert_eq!(edited, doc);
    }

    #[test]
    fn out_of_range_rows_are_noops(doc in arb_document(), extra in 0usize..4, ch in any::<char>(), col in 0usize..10) {
        let row = doc.line_count() + extra;
        let mut edited = doc.clone();
        edited.apply(&Edit::insert(ch, row, col));
        edited.apply(&Edit::delete(row, col));
        prop_assert_eq!(edited, doc);
    }

    #[test]
    fn lines_never_contain_terminators(edits in prop::collection::vec(arb_edit(), 0..40)) {
        let mut engine = BufferEngine::new(NullView);
        for edit in &edits {
            engine.apply(edit);
        }
        for line in engine.document().lines() {
            prop_assert!(!line.contains('\n') && !line.contains('\r'));
        }
        prop_assert!(engine.document().line_count() >= 1);
    }

    #[test]
    fn replay_is_deterministic(edits in prop::collection::vec(arb_edit(), 0..40)) {
        let mut a = Document::new();
        let mut b = Document::new();
        for edit in &edits {
            a.apply(edit);
            b.apply(edit);
        }
        prop_assert_eq!(a, b);
    }
}

// --- Codec ---

proptest! {
    #[test]
    fn encoded_frames_have_exactly_one_delimiter(edit in arb_edit()) {
        let bytes = edit.encode().unwrap();
        prop_assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), 1);
        prop_assert_eq!(bytes.last(), Some(&b'\n'));
        prop_assert_eq!(Edit::decode(&bytes).unwrap(), edit);
    }

    #[test]
    fn decoding_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = Edit::decode(&bytes);
    }

    #[test]
    fn unknown_op_fails_and_leaves_buffer_alone(doc in arb_document(), op in "[a-z]{1,8}") {
        prop_assume!(op != "insert" && op != "delete");
        let frame = format!(r#"{{"op":"{}","char":97,"row":0,"col":0}}"#, op);
        let mut edited = doc.clone();
        match Edit::decode(frame.as_bytes()) {
            Ok(edit) => {
                edited.apply(&edit);
                prop_assert!(false, "decoded unknown op {:?} as {:?}", op, edit.op);
            }
            Err(err) => prop_assert!(matches!(err, CodecError::Malformed(_))),
        }
        prop_assert_eq!(edited, doc);
    }
}

#[test]
fn insert_variant_carries_character() {
    let edit = Edit::insert('z', 0, 0);
    assert_eq!(edit.op, EditOp::Insert('z'));
}
