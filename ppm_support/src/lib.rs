extern crate custom_error;

pub mod reader;

pub use reader::{read_dimensions, PPMReader, PPMReaderError};
