//! Newline-delimited frames over a byte stream.
//!
//! Wire format: `<JSON edit>\n`, one edit per frame. See [`edit_core::Edit`]
//! for the payload.

use edit_core::{Edit, FRAME_DELIMITER};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::SessionError;

/// One unit read off the stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// Frame payload without its delimiter.
    Data(Vec<u8>),
    /// A frame longer than the limit; its bytes were skipped up to the next
    /// delimiter.
    Oversized { len: usize },
}

/// Splits a buffered byte stream into frames, never holding more than
/// `max_frame_bytes` of a single frame in memory.
pub struct FrameReader<R> {
    inner: R,
    max_frame_bytes: usize,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, max_frame_bytes: usize) -> Self {
        Self {
            inner,
            max_frame_bytes,
            buf: Vec::new(),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on a clean end of stream. Bytes after the last
    /// delimiter are returned as a final frame. Not cancel safe: a partially
    /// read frame is lost if the future is dropped.
    pub async fn next_frame(&mut self) -> std::io::Result<Option<Frame>> {
        self.buf.clear();
        let mut skipped: Option<usize> = None;

        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                return Ok(match skipped {
                    Some(len) => Some(Frame::Oversized { len }),
                    None if self.buf.is_empty() => None,
                    None => Some(Frame::Data(std::mem::take(&mut self.buf))),
                });
            }

            let delimiter = available.iter().position(|&b| b == FRAME_DELIMITER);
            let chunk = &available[..delimiter.unwrap_or(available.len())];

            match skipped.as_mut() {
                Some(len) => *len += chunk.len(),
                None if self.buf.len() + chunk.len() > self.max_frame_bytes => {
                    skipped = Some(self.buf.len() + chunk.len());
                    self.buf.clear();
                }
                None => self.buf.extend_from_slice(chunk),
            }

            let used = chunk.len() + usize::from(delimiter.is_some());
            self.inner.consume(used);

            if delimiter.is_some() {
                return Ok(Some(match skipped {
                    Some(len) => Frame::Oversized { len },
                    None => Frame::Data(std::mem::take(&mut self.buf)),
                }));
            }
        }
    }
}

/// Encode `edit` and write it as one frame.
pub async fn write_edit<W: AsyncWrite + Unpin>(
    writer: &mut W,
    edit: &Edit,
) -> Result<(), SessionError> {
    let bytes = edit.encode()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn collect(input: &[u8], max: usize) -> Vec<Frame> {
        // Tiny buffer so frames straddle fill_buf calls.
        let reader = BufReader::with_capacity(4, input);
        let mut frames = FrameReader::new(reader, max);
        let mut out = Vec::new();
        while let Some(frame) = frames.next_frame().await.unwrap() {
            out.push(frame);
        }
        out
    }

    #[tokio::test]
    async fn splits_on_delimiter() {
        let frames = collect(b"one\ntwo\n\nthree\n", 64).await;
        assert_eq!(
            frames,
            vec![
                Frame::Data(b"one".to_vec()),
                Frame::Data(b"two".to_vec()),
                Frame::Data(Vec::new()),
                Frame::Data(b"three".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn trailing_bytes_become_last_frame() {
        let frames = collect(b"a\nbc", 64).await;
        assert_eq!(
            frames,
            vec![Frame::Data(b"a".to_vec()), Frame::Data(b"bc".to_vec())]
        );
    }

    #[tokio::test]
    async fn empty_stream_is_clean_eof() {
        assert!(collect(b"", 64).await.is_empty());
    }

    #[tokio::test]
    async fn oversized_frame_is_skipped_and_reading_resumes() {
        let frames = collect(b"ok\n0123456789abcdef\nnext\n", 8).await;
        assert_eq!(
            frames,
            vec![
                Frame::Data(b"ok".to_vec()),
                Frame::Oversized { len: 16 },
                Frame::Data(b"next".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn frame_at_limit_is_accepted() {
        let frames = collect(b"12345678\n", 8).await;
        assert_eq!(frames, vec![Frame::Data(b"12345678".to_vec())]);
    }

    #[tokio::test]
    async fn oversized_tail_at_eof() {
        let frames = collect(b"0123456789", 4).await;
        assert_eq!(frames, vec![Frame::Oversized { len: 10 }]);
    }

    #[tokio::test]
    async fn write_edit_emits_one_frame() {
        let mut out = Vec::new();
        write_edit(&mut out, &Edit::insert('q', 1, 2)).await.unwrap();
        write_edit(&mut out, &Edit::delete(1, 3)).await.unwrap();

        let mut frames = FrameReader::new(BufReader::new(out.as_slice()), 1024);
        let first = frames.next_frame().await.unwrap().unwrap();
        let second = frames.next_frame().await.unwrap().unwrap();
        assert!(frames.next_frame().await.unwrap().is_none());

        let Frame::Data(first) = first else {
            panic!("expected data frame")
        };
        let Frame::Data(second) = second else {
            panic!("expected data frame")
        };
        assert_eq!(Edit::decode(&first).unwrap(), Edit::insert('q', 1, 2));
        assert_eq!(Edit::decode(&second).unwrap(), Edit::delete(1, 3));
    }
}
