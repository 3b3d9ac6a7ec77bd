use std::collections::HashMap;

use crate::{bits::BitPacker, common::{ByteSink, GIFWriterError, MAX_CODE_SIZE, MAX_CODE_VALUE, MAX_LZW_CODE_SIZE, MIN_LZW_CODE_SIZE}};

/// GIF flavoured LZW compressor.
///
/// Codes start one bit wider than the literal alphabet, grow by one bit every time the
/// dictionary outgrows the current width, and never exceed 12 bits. When the dictionary is
/// full a clear code is emitted and the dictionary starts over.
///
/// Nothing is written until [`LZWEncoder::start`] is called.
pub struct LZWEncoder<S: ByteSink> {
    packer: BitPacker<S>,
    min_code_size: u8,
    code_size: u8,
    next_code: u16,

    // (code of the matched prefix, next symbol) -> code. Single symbols map to themselves.
    dictionary: HashMap<(u16, u8), u16>,
    matched: Option<u16>,
    started: bool,
}

impl<S: ByteSink> LZWEncoder<S> {

    pub fn new(min_code_size: u8, sink: S) -> Result<Self, GIFWriterError> {
        if min_code_size < MIN_LZW_CODE_SIZE || min_code_size > MAX_LZW_CODE_SIZE {
            return Err(GIFWriterError::InvalidOptions {
                description: format!(
                    "lzw minimum code size should be in {}..={}, got {}",
                    MIN_LZW_CODE_SIZE, MAX_LZW_CODE_SIZE, min_code_size
                ),
            });
        }

        let clear_code = 1u16 << min_code_size;

        Ok(LZWEncoder {
            packer: BitPacker::new(sink),
            min_code_size,
            code_size: min_code_size + 1,
            next_code: clear_code + 2,
            dictionary: HashMap::new(),
            matched: None,
            started: false,
        })
    }

    pub fn min_code_size(&self) -> u8 {
        self.min_code_size
    }

    /// Number of bits used for the next code.
    pub fn code_size(&self) -> u8 {
        self.code_size
    }

    pub fn clear_code(&self) -> u16 {
        1 << self.min_code_size
    }

    pub fn end_code(&self) -> u16 {
        self.clear_code() + 1
    }

    /// Opens the code stream with a clear code.
    pub fn start(&mut self) -> Result<(), GIFWriterError> {
        if self.started {
            return Err(GIFWriterError::InvalidState {
                description: "lzw stream is already started".to_string(),
            });
        }

        self.started = true;
        self.write_code(self.clear_code())
    }

    pub fn encode(&mut self, symbol: u8) -> Result<(), GIFWriterError> {
        if !self.started {
            return Err(GIFWriterError::InvalidState {
                description: "symbols can not be encoded before the lzw stream is started".to_string(),
            });
        }

        if symbol as u16 >= self.clear_code() {
            return Err(GIFWriterError::InvalidState {
                description: format!("symbol {} does not fit into {} bits", symbol, self.min_code_size),
            });
        }

        let prefix = match self.matched {
            Some(v) => v,
            None => {
                self.matched = Some(symbol as u16);
                return Ok(());
            }
        };

        if let Some(code) = self.dictionary.get(&(prefix, symbol)) {
            self.matched = Some(*code);
            return Ok(());
        }

        self.write_code(prefix)?;
        self.matched = Some(symbol as u16);

        if self.next_code > MAX_CODE_VALUE {
            self.write_code(self.clear_code())?;
            self.reset_dictionary();
        } else {
            self.add_code(prefix, symbol);
        }

        Ok(())
    }

    pub fn encode_all(&mut self, symbols: &[u8]) -> Result<(), GIFWriterError> {
        for symbol in symbols {
            self.encode(*symbol)?;
        }

        Ok(())
    }

    /// Writes the code for the pending match and the end of information code, then flushes
    /// the packed bits downstream.
    ///
    /// The end code may be one bit wider than the last data code: decoders add a dictionary
    /// entry after reading that code, so the width grows here when the dictionary reaches the
    /// next power of two.
    pub fn finish(mut self) -> Result<S, GIFWriterError> {
        if !self.started {
            return Err(GIFWriterError::InvalidState {
                description: "lzw stream was never started".to_string(),
            });
        }

        if let Some(code) = self.matched.take() {
            self.write_code(code)?;

            // a decoder adds its last entry after reading this code and may widen before the end code
            if self.next_code == 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
                self.code_size += 1;
            }
        }

        self.write_code(self.end_code())?;
        self.packer.finish()
    }

    fn write_code(&mut self, code: u16) -> Result<(), GIFWriterError> {
        self.packer.insert(self.code_size, code)
    }

    fn add_code(&mut self, prefix: u16, symbol: u8) {
        let code = self.next_code;
        self.dictionary.insert((prefix, symbol), code);
        self.next_code += 1;

        if code == 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
            self.code_size += 1;
        }
    }

    fn reset_dictionary(&mut self) {
        trace!("lzw dictionary is full, starting over");

        self.dictionary.clear();
        self.next_code = self.end_code() + 1;
        self.code_size = self.min_code_size + 1;
    }
}
