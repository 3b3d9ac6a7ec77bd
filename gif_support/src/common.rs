use std::io;

use custom_error::custom_error;

// see https://www.w3.org/Graphics/GIF/spec-gif89a.txt

custom_error! {pub GIFWriterError
    IO {source: io::Error} = "failed to write gif stream: {source}",
    InvalidFrame {description: String} = "Invalid frame: {description}",
    InvalidOptions {description: String} = "Invalid options: {description}",
    InvalidState {description: String} = "Invalid encoder state: {description}",
}

pub const SIGNATURE: &[u8; 6] = b"GIF89a";

pub const MAX_SUB_BLOCK_SIZE: usize = 255;
pub const MAX_COLORS: usize = 256;

pub const MIN_LZW_CODE_SIZE: u8 = 2;
pub const MAX_LZW_CODE_SIZE: u8 = 8;
pub const MAX_CODE_SIZE: u8 = 12;
pub const MAX_CODE_VALUE: u16 = 4095;

pub const EXTENSION_INTRODUCER: u8 = 0x21;
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
pub const APPLICATION_EXTENSION_LABEL: u8 = 0xFF;
pub const IMAGE_SEPARATOR: u8 = 0x2C;
pub const TRAILER: u8 = 0x3B;

pub const NETSCAPE_SIGNATURE: &[u8; 11] = b"NETSCAPE2.0";

pub const SCREEN_DESCRIPTOR_SIZE: usize = 7;
pub const IMAGE_DESCRIPTOR_SIZE: usize = 10;
pub const GRAPHIC_CONTROL_BLOCK_SIZE: usize = 8;

// no global color table, color resolution of 8 bits (encoded as 7), not sorted
pub const SCREEN_DESCRIPTOR_PACKED: u8 = 0x70;

// local color table present, not interlaced, not sorted. Low 3 bits hold the table bit depth - 1.
pub fn image_descriptor_packed(bit_depth: u8) -> u8 {
    debug_assert!(bit_depth >= 1 && bit_depth <= 8);
    0x80 | (bit_depth - 1)
}

/// Destination for a stream of bytes produced one at a time.
///
/// `flush` asks the sink to move anything it buffers downstream. A sink with nothing
/// buffered must not produce output on `flush`.
pub trait ByteSink {

    fn push(&mut self, byte: u8) -> Result<(), GIFWriterError>;

    fn flush(&mut self) -> Result<(), GIFWriterError>;
}

impl ByteSink for Vec<u8> {

    fn push(&mut self, byte: u8) -> Result<(), GIFWriterError> {
        Vec::push(self, byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), GIFWriterError> {
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {

    fn push(&mut self, byte: u8) -> Result<(), GIFWriterError> {
        (**self).push(byte)
    }

    fn flush(&mut self) -> Result<(), GIFWriterError> {
        (**self).flush()
    }
}
