use std::io::Write;

use crate::common::{ByteSink, GIFWriterError, MAX_SUB_BLOCK_SIZE};

/// Packs incoming bytes into GIF data sub-blocks: a one byte length followed by at most
/// 255 bytes of payload.
///
/// A full sub-block is written out as soon as the 255th byte arrives. Whatever is left in
/// the buffer when the writer goes out of scope is written as a shorter sub-block.
pub struct SubBlockWriter<W: Write> {
    out: W,
    buffer: Vec<u8>,
}

impl<W: Write> SubBlockWriter<W> {

    pub fn new(out: W) -> Self {
        SubBlockWriter {
            out,
            buffer: Vec::with_capacity(MAX_SUB_BLOCK_SIZE),
        }
    }

    pub fn push(&mut self, byte: u8) -> Result<(), GIFWriterError> {
        self.buffer.push(byte);

        if self.buffer.len() == MAX_SUB_BLOCK_SIZE {
            self.flush()?;
        }

        Ok(())
    }

    /// Writes the current sub-block as-is, even when it is empty. An empty sub-block is the
    /// block terminator.
    pub fn flush(&mut self) -> Result<(), GIFWriterError> {
        debug_assert!(self.buffer.len() <= MAX_SUB_BLOCK_SIZE);

        self.out.write_all(&[self.buffer.len() as u8])?;
        self.out.write_all(&self.buffer)?;
        self.buffer.clear();

        Ok(())
    }

    /// Number of payload bytes in the current sub-block.
    pub fn current_block_size(&self) -> usize {
        self.buffer.len()
    }
}

// Only pending bytes are pushed downstream here: the terminator is always written explicitly.
impl<W: Write> ByteSink for SubBlockWriter<W> {

    fn push(&mut self, byte: u8) -> Result<(), GIFWriterError> {
        SubBlockWriter::push(self, byte)
    }

    fn flush(&mut self) -> Result<(), GIFWriterError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        SubBlockWriter::flush(self)
    }
}

impl<W: Write> Drop for SubBlockWriter<W> {

    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            if let Err(err) = SubBlockWriter::flush(self) {
                warn!("failed to write remaining {} bytes of sub-block: {}", self.buffer.len(), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_block_is_flushed_automatically() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut writer = SubBlockWriter::new(&mut out);
            for i in 0..255 {
                writer.push(i as u8).expect("failed to push byte");
            }

            assert_eq!(writer.current_block_size(), 0);
        }

        assert_eq!(out.len(), 256);
        assert_eq!(out[0], 0xFF);
        assert_eq!(out[1], 0);
        assert_eq!(out[255], 254);
    }

    #[test]
    fn test_empty_flush_writes_terminator() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut writer = SubBlockWriter::new(&mut out);
            writer.flush().expect("failed to flush");
        }

        assert_eq!(out, vec![0]);
    }

    #[test]
    fn test_partial_blocks() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut writer = SubBlockWriter::new(&mut out);
            for _ in 0..300 {
                writer.push(7).expect("failed to push byte");
            }
            assert_eq!(writer.current_block_size(), 45);

            writer.flush().expect("failed to flush");
            writer.flush().expect("failed to write terminator");
        }

        assert_eq!(out.len(), 1 + 255 + 1 + 45 + 1);
        assert_eq!(out[0], 255);
        assert_eq!(out[256], 45);
        assert!(out[257..302].iter().all(|v| *v == 7));
        assert_eq!(out[302], 0);
    }

    #[test]
    fn test_remaining_bytes_written_on_drop() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut writer = SubBlockWriter::new(&mut out);
            writer.push(1).expect("failed to push byte");
            writer.push(2).expect("failed to push byte");
        }

        assert_eq!(out, vec![2, 1, 2]);
    }

    #[test]
    fn test_sink_flush_skips_empty_block() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut writer = SubBlockWriter::new(&mut out);
            ByteSink::flush(&mut writer).expect("failed to flush");
            ByteSink::push(&mut writer, 9).expect("failed to push byte");
            ByteSink::flush(&mut writer).expect("failed to flush");
        }

        assert_eq!(out, vec![1, 9]);
    }
}
