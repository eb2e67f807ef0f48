use crate::error::{TransportError, WriteOutcome};

/// A single outbound transport buffer. When packing is enabled several
/// encoded messages share one `Buffer`, each one committed in turn via
/// [`Buffer::commit`] — "packing", per spec.md §4.G.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u8>,
    cursor: usize,
    packable: bool,
}

impl Buffer {
    pub fn new(capacity: usize, packable: bool) -> Self {
        Buffer {
            data: vec![0u8; capacity],
            cursor: 0,
            packable,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn is_packable(&self) -> bool {
        self.packable
    }

    /// Returns a writable slot of `len` bytes at the current cursor, or
    /// `None` if it would not fit.
    pub fn write_slot(&mut self, len: usize) -> Option<&mut [u8]> {
        if len > self.remaining() {
            return None;
        }
        let start = self.cursor;
        Some(&mut self.data[start..start + len])
    }

    /// Commits `len` bytes written via `write_slot` ("packs" the message
    /// into the buffer — spec.md §4.G "invoke the transport-level pack
    /// API, which returns a new cursor into the same backing storage").
    pub fn commit(&mut self, len: usize) {
        self.cursor += len;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }
}

/// Outbound buffer bookkeeping owned by a `ProviderSession` (spec.md §3:
/// `writingBuffer`, `packedCount`, `lastWriteResult`). Kept in
/// `mdp-transport` because it reaches directly into a channel's socket to
/// write; `mdp-core` owns one of these per session.
pub struct SessionBuffering {
    writing_buffer: Option<Buffer>,
    packed_count: u32,
    pub last_write_result: i32,
    pub packing_buffer_length: usize,
    pub max_per_pack: u32,
    pub total_msgs_per_buffer_ratio_count: u64,
}

impl SessionBuffering {
    pub fn new(packing_buffer_length: usize, max_per_pack: u32) -> Self {
        SessionBuffering {
            writing_buffer: None,
            packed_count: 0,
            last_write_result: 0,
            packing_buffer_length,
            max_per_pack,
            total_msgs_per_buffer_ratio_count: 0,
        }
    }

    pub fn packed_count(&self) -> u32 {
        self.packed_count
    }

    fn packing_enabled(&self) -> bool {
        self.max_per_pack > 1
    }

    /// Obtains a buffer suitable for encoding a message of estimated size
    /// `length` (spec.md §4.G "acquire(L)").
    pub fn acquire(
        &mut self,
        chan: &mut super::channel::ChannelInfo,
        length: usize,
    ) -> Result<(), WriteOutcome> {
        if !self.packing_enabled() {
            self.writing_buffer = Some(chan.get_buffer(length, false)?);
            return Ok(());
        }

        if length > self.packing_buffer_length {
            // Finalize any buffer in progress, then get a dedicated,
            // non-packed buffer sized exactly for this oversized message.
            if self.writing_buffer.is_some() {
                self.write(chan)?;
            }
            self.writing_buffer = Some(chan.get_buffer(length, false)?);
            return Ok(());
        }

        match &self.writing_buffer {
            None => {
                self.writing_buffer = Some(chan.get_buffer(self.packing_buffer_length, true)?);
            }
            Some(buf) if buf.remaining() < length => {
                self.write(chan)?;
                self.writing_buffer = Some(chan.get_buffer(self.packing_buffer_length, true)?);
            }
            Some(_) => {}
        }
        Ok(())
    }

    pub fn writing_buffer_mut(&mut self) -> Option<&mut Buffer> {
        self.writing_buffer.as_mut()
    }

    /// Finalizes the current message: packs it into the open buffer, or
    /// writes the buffer out now (spec.md §4.G "submit(allowPack)").
    pub fn submit(
        &mut self,
        chan: &mut super::channel::ChannelInfo,
        encoded_len: usize,
        allow_pack: bool,
    ) -> Result<WriteOutcome, TransportError> {
        self.total_msgs_per_buffer_ratio_count += 1;

        let at_pack_limit = self.packed_count + 1 == self.max_per_pack;
        if !self.packing_enabled() || at_pack_limit || !allow_pack {
            self.writing_buffer
                .as_mut()
                .expect("submit called with no acquired buffer")
                .commit(encoded_len);
            self.packed_count = 0;
            return self.write(chan).map_err(|outcome| match outcome {
                WriteOutcome::Fatal => TransportError::Closed("fatal write error".into()),
                _ => TransportError::Closed("unexpected write outcome".into()),
            });
        }

        self.writing_buffer
            .as_mut()
            .expect("submit called with no acquired buffer")
            .commit(encoded_len);
        self.packed_count += 1;
        Ok(WriteOutcome::Success)
    }

    /// Writes the current buffer to the transport, handling the
    /// transient return codes per spec.md §4.G "write()".
    pub fn write(&mut self, chan: &mut super::channel::ChannelInfo) -> Result<WriteOutcome, WriteOutcome> {
        let buf = match self.writing_buffer.take() {
            Some(b) => b,
            None => return Ok(WriteOutcome::Success),
        };

        loop {
            match chan.write_buffer(&buf) {
                WriteOutcome::CallAgain => {
                    chan.flush_now();
                    continue;
                }
                WriteOutcome::FlushFailedButActive => {
                    self.last_write_result = 1;
                    chan.need_flush = true;
                    return Ok(WriteOutcome::FlushPending);
                }
                WriteOutcome::Fatal => {
                    self.last_write_result = -1;
                    return Err(WriteOutcome::Fatal);
                }
                other @ (WriteOutcome::Success | WriteOutcome::FlushPending) => {
                    self.last_write_result = if other == WriteOutcome::FlushPending { 1 } else { 0 };
                    if other == WriteOutcome::FlushPending {
                        chan.need_flush = true;
                    }
                    return Ok(other);
                }
                WriteOutcome::NoBuffers => return Err(WriteOutcome::NoBuffers),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_commit_advances_cursor_for_packing() {
        let mut b = Buffer::new(64, true);
        assert_eq!(b.remaining(), 64);
        {
            let slot = b.write_slot(10).unwrap();
            slot.fill(0xAB);
        }
        b.commit(10);
        assert_eq!(b.remaining(), 54);
        assert_eq!(b.as_bytes().len(), 10);
        assert!(b.as_bytes().iter().all(|&x| x == 0xAB));
    }

    #[test]
    fn write_slot_rejects_oversized_request() {
        let mut b = Buffer::new(4, false);
        assert!(b.write_slot(5).is_none());
        assert!(b.write_slot(4).is_some());
    }
}
