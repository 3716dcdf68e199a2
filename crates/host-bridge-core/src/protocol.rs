//! Wire format for shipping native commands across a process boundary.
//!
//! Commands are queued by [`BatchingViewManager`] and written as one JSON
//! [`CommandBatch`] per frame, each frame prefixed by its length as a
//! big-endian `u32`.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::props::Payload;
use crate::tag::Tag;
use crate::view_manager::{ManageChildren, RecordingViewManager, UiCommand, ViewManager};

pub const MAX_BATCH_BYTES: usize = 1_048_576;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    pub commands: Vec<UiCommand>,
}

impl CommandBatch {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Replays the batch in order.
    pub fn apply_to<V: ViewManager + ?Sized>(&self, view_manager: &mut V) {
        for command in &self.commands {
            command.apply_to(view_manager);
        }
    }
}

/// Queues commands until [`flush`](Self::flush) writes them as one frame.
#[derive(Debug, Default)]
pub struct BatchingViewManager {
    pending: RecordingViewManager,
}

impl BatchingViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn take_batch(&mut self) -> CommandBatch {
        CommandBatch {
            commands: self.pending.take_commands(),
        }
    }

    /// Writes the queued commands as a single frame. Nothing is written when
    /// the queue is empty. Returns the number of commands flushed.
    pub fn flush(&mut self, writer: &mut impl Write) -> io::Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let batch = self.take_batch();
        write_batch(writer, &batch)?;
        writer.flush()?;
        Ok(batch.len())
    }
}

impl ViewManager for BatchingViewManager {
    fn create_view(&mut self, tag: Tag, class_name: &str, root_tag: Tag, payload: &Payload) {
        self.pending.create_view(tag, class_name, root_tag, payload);
    }

    fn update_view(&mut self, tag: Tag, class_name: &str, payload: &Payload) {
        self.pending.update_view(tag, class_name, payload);
    }

    fn set_children(&mut self, tag: Tag, children: &[Tag]) {
        self.pending.set_children(tag, children);
    }

    fn remove_children(&mut self, tag: Tag, children: &[Tag]) {
        self.pending.remove_children(tag, children);
    }

    fn manage_children(&mut self, tag: Tag, ops: &ManageChildren) {
        self.pending.manage_children(tag, ops);
    }
}

pub fn write_batch(writer: &mut impl Write, batch: &CommandBatch) -> io::Result<()> {
    let payload = serde_json::to_vec(batch).map_err(json_error)?;
    write_frame(writer, &payload, MAX_BATCH_BYTES)
}

pub fn read_batch(reader: &mut impl Read) -> io::Result<CommandBatch> {
    let payload = read_frame(reader, MAX_BATCH_BYTES)?;
    serde_json::from_slice(&payload).map_err(json_error)
}

fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
    let mut len_buf = [0_u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} > {max_payload}"),
        ));
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
    if payload.len() > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} > {}", payload.len(), max_payload),
        ));
    }

    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "payload exceeds u32"))?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

fn json_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_manager::MemoryViewManager;
    use std::io::Cursor;

    #[test]
    fn flushed_batch_decodes_to_queued_commands() {
        let mut batching = BatchingViewManager::new();
        batching.create_view(Tag(2), "RCTView", Tag(1), &Payload::new());
        batching.create_view(Tag(3), "RCTRawText", Tag(1), &crate::props::text_payload("hi"));
        batching.set_children(Tag(2), &[Tag(3)]);
        batching.set_children(Tag(1), &[Tag(2)]);
        assert_eq!(batching.pending(), 4);

        let mut out = Vec::new();
        assert_eq!(batching.flush(&mut out).expect("flush"), 4);
        assert_eq!(batching.pending(), 0);

        let batch = read_batch(&mut Cursor::new(out)).expect("read batch");
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.commands[1].name(), "create_view");

        let mut native = MemoryViewManager::new();
        batch.apply_to(&mut native);
        assert_eq!(native.dump_tree(Tag(1)), "[1] RCTRootView\n  [2] RCTView\n    [3] RCTRawText\n");
    }

    #[test]
    fn empty_queue_writes_nothing() {
        let mut batching = BatchingViewManager::new();
        let mut out = Vec::new();
        assert_eq!(batching.flush(&mut out).expect("flush"), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn frame_length_is_big_endian() {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc", MAX_BATCH_BYTES).expect("frame write");
        assert_eq!(&out[0..4], &[0, 0, 0, 3]);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let len = (MAX_BATCH_BYTES as u32) + 1;
        let mut cursor = Cursor::new(len.to_be_bytes().to_vec());
        let err = read_batch(&mut cursor).expect_err("expected too large");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 5, b'{', b'}']);
        let err = read_batch(&mut cursor).expect_err("expected eof");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn malformed_json_is_invalid_data() {
        let mut out = Vec::new();
        write_frame(&mut out, br#"{"commands":[{"op":"explode"}]}"#, MAX_BATCH_BYTES)
            .expect("frame write");
        let err = read_batch(&mut Cursor::new(out)).expect_err("expected decode error");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
