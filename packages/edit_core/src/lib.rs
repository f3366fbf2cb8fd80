//! Edit Core - edit records and the line-oriented buffer engine
//!
//! This crate holds everything that has to agree between the two ends of a
//! colab connection: the [`Edit`] record, its newline-delimited JSON wire form,
//! and the [`Document`] / [`BufferEngine`] pair that applies edits to text.
//! It has no async or network dependencies.
//!
//! # Example
//!
//! ```
//! use edit_core::{BufferEngine, Edit, NullView};
//!
//! let mut engine = BufferEngine::new(NullView);
//! engine.apply(&Edit::insert('h', 0, 0));
//! engine.apply(&Edit::insert('i', 0, 1));
//! engine.apply(&Edit::insert('\n', 0, 2));
//! assert_eq!(engine.document().text(), "hi\n");
//!
//! let frame = Edit::delete(1, 0).encode().unwrap();
//! assert_eq!(frame.last(), Some(&b'\n'));
//! let edit = Edit::decode(&frame).unwrap();
//! engine.apply(&edit);
//! assert_eq!(engine.document().lines(), ["hi"]);
//! ```

mod document;
mod edit;
mod engine;
mod error;

pub use document::{ApplyOutcome, Document, DropReason};
pub use edit::{Edit, EditOp, FRAME_DELIMITER};
pub use engine::{BufferEngine, NullView, View};
pub use error::CodecError;
