#[macro_use]
extern crate log;
extern crate custom_error;

pub mod bits;
pub mod color_table;
pub mod common;
pub mod lzw;
pub mod median_cut;
pub mod sub_block;
pub mod writer;

#[cfg(test)]
mod test_utils;

pub use common::GIFWriterError;
pub use writer::{GIFBuilder, GIFOptions, GIFWriter};
