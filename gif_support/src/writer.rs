use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use gifgen_core::models::{Image, ImageIOError, ImageWriter, ImageWriterOptions};

use crate::{
    color_table::ColorTable,
    common::*,
    lzw::LZWEncoder,
    median_cut::median_cut,
    sub_block::SubBlockWriter,
};

pub const OPTION_DELAY: &str = "delay";
pub const OPTION_LOOP: &str = "loop";
pub const OPTION_MAX_COLORS: &str = "max_colors";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GIFOptions {
    pub delay: u16, // hundredths of a second between frames
    pub looping: bool,
    pub max_colors: usize,
}

impl Default for GIFOptions {

    fn default() -> Self {
        GIFOptions {
            delay: 0,
            looping: false,
            max_colors: MAX_COLORS,
        }
    }
}

/// Streams a GIF89a file frame by frame. Every frame gets its own median cut color table.
///
/// Creating a builder does not write anything. The header goes out with the first frame (or on
/// `finish` for a stream without frames). A stream that is dropped before `finish` lacks its
/// trailer and is not a valid GIF.
pub struct GIFBuilder<W: Write> {
    out: W,
    width: u16,
    height: u16,
    options: GIFOptions,
    header_written: bool,
    frames: usize,
}

impl<W: Write> GIFBuilder<W> {

    pub fn new(out: W, width: usize, height: usize, options: GIFOptions) -> Result<Self, GIFWriterError> {
        let width = checked_dimension("width", width)?;
        let height = checked_dimension("height", height)?;

        if options.max_colors == 0 || options.max_colors > MAX_COLORS {
            return Err(GIFWriterError::InvalidOptions {
                description: format!("max colors should be in 1..={}, got {}", MAX_COLORS, options.max_colors),
            });
        }

        Ok(GIFBuilder {
            out,
            width,
            height,
            options,
            header_written: false,
            frames: 0,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    /// Quantizes the image and appends it as the next frame. All frames must match the
    /// dimensions the builder was created with.
    pub fn add_frame(&mut self, image: &Image) -> Result<(), GIFWriterError> {
        if image.width != self.width as usize || image.height != self.height as usize || image.pixels.len() != image.width * image.height {
            return Err(GIFWriterError::InvalidFrame {
                description: format!(
                    "frame #{} is {}x{} with {} pixels, expected {}x{}",
                    self.frames, image.width, image.height, image.pixels.len(), self.width, self.height
                ),
            });
        }

        self.write_header()?;

        info!("reducing colors of frame #{} to {}", self.frames, self.options.max_colors);
        let color_table = median_cut(image, self.options.max_colors)?;
        debug!("frame #{}: {} colors, table bit depth {}", self.frames, color_table.len(), color_table.bit_depth());

        self.out.write_all(&write_graphic_control_extension(self.options.delay))?;
        self.out.write_all(&write_image_descriptor(self.width, self.height, &color_table))?;
        self.out.write_all(&color_table.to_bytes())?;
        self.write_image_data(image, &color_table)?;

        self.frames += 1;
        Ok(())
    }

    /// Terminates the stream and hands back the output.
    pub fn finish(mut self) -> Result<W, GIFWriterError> {
        self.write_header()?;
        self.out.write_all(&[TRAILER])?;
        self.out.flush()?;

        info!("gif stream complete, {} frame{}", self.frames, if self.frames == 1 { "" } else { "s" });
        Ok(self.out)
    }

    fn write_header(&mut self) -> Result<(), GIFWriterError> {
        if self.header_written {
            return Ok(());
        }

        self.out.write_all(SIGNATURE)?;
        self.out.write_all(&write_screen_descriptor(self.width, self.height))?;
        if self.options.looping {
            self.out.write_all(&write_netscape_extension())?;
        }

        self.header_written = true;
        Ok(())
    }

    fn write_image_data(&mut self, image: &Image, color_table: &ColorTable) -> Result<(), GIFWriterError> {
        let min_code_size = color_table.lzw_min_code_size();
        self.out.write_all(&[min_code_size])?;

        let indices = color_table.palettize(image);

        let mut sub_blocks = SubBlockWriter::new(&mut self.out);
        let mut encoder = LZWEncoder::new(min_code_size, &mut sub_blocks)?;
        encoder.start()?;
        encoder.encode_all(&indices)?;
        encoder.finish()?;

        // empty sub-block terminates the image data
        debug_assert_eq!(sub_blocks.current_block_size(), 0);
        sub_blocks.flush()?;

        Ok(())
    }
}

fn checked_dimension(name: &str, value: usize) -> Result<u16, GIFWriterError> {
    if value == 0 || value > u16::MAX as usize {
        return Err(GIFWriterError::InvalidFrame {
            description: format!("{} should be in 1..={}, got {}", name, u16::MAX, value),
        });
    }

    Ok(value as u16)
}

fn write_screen_descriptor(width: u16, height: u16) -> Vec<u8> {
    let mut data: Vec<u8> = vec![0 as u8; SCREEN_DESCRIPTOR_SIZE];

    LittleEndian::write_u16(&mut data[0..2], width);
    LittleEndian::write_u16(&mut data[2..4], height);
    data[4] = SCREEN_DESCRIPTOR_PACKED;

    // data[5] is background color, unused without a global color table
    // data[6] is aspect ratio, 0 means no aspect ratio information

    data
}

// NETSCAPE2.0 application extension, makes viewers loop the animation forever.
fn write_netscape_extension() -> Vec<u8> {
    let mut data = vec![EXTENSION_INTRODUCER, APPLICATION_EXTENSION_LABEL, NETSCAPE_SIGNATURE.len() as u8];
    data.extend_from_slice(NETSCAPE_SIGNATURE);

    data.push(3); // sub-block size
    data.push(1); // sub-block id
    data.extend_from_slice(&[0, 0]); // repetitions, 0 is infinite
    data.push(0);

    data
}

fn write_graphic_control_extension(delay: u16) -> Vec<u8> {
    let mut data: Vec<u8> = vec![0 as u8; GRAPHIC_CONTROL_BLOCK_SIZE];
    data[0] = EXTENSION_INTRODUCER;
    data[1] = GRAPHIC_CONTROL_LABEL;
    data[2] = 4; // block size

    // data[3] is packed: no disposal method, no user input, no transparency
    LittleEndian::write_u16(&mut data[4..6], delay);
    // data[6] is transparent color index, data[7] is block terminator

    data
}

fn write_image_descriptor(width: u16, height: u16, color_table: &ColorTable) -> Vec<u8> {
    let mut data: Vec<u8> = vec![0 as u8; IMAGE_DESCRIPTOR_SIZE];
    data[0] = IMAGE_SEPARATOR;

    LittleEndian::write_u16(&mut data[1..3], 0); // left
    LittleEndian::write_u16(&mut data[3..5], 0); // top
    LittleEndian::write_u16(&mut data[5..7], width);
    LittleEndian::write_u16(&mut data[7..9], height);

    data[9] = image_descriptor_packed(color_table.bit_depth());

    data
}

pub struct GIFWriter {
}

impl GIFWriter {

    pub fn new() -> Self {
        GIFWriter {
        }
    }

    /// Encodes the images as the frames of one animation.
    pub fn write_frames(&self, images: &[Image], options: &ImageWriterOptions) -> Result<Vec<u8>, ImageIOError> {
        let options = adjust_options(options)?;

        let first = match images.first() {
            Some(v) => v,
            None => return Err(ImageIOError::FailedToWrite {
                description: "at least one frame is required".to_string(),
            }),
        };

        encode_frames(images, first.width, first.height, options).map_err(|err| ImageIOError::FailedToWrite {
            description: format!("failed to write gif: {}", err),
        })
    }
}

impl ImageWriter for GIFWriter {

    fn write(&self, image: &Image, options: &ImageWriterOptions) -> Result<Vec<u8>, ImageIOError> {
        self.write_frames(std::slice::from_ref(image), options)
    }
}

fn encode_frames(images: &[Image], width: usize, height: usize, options: GIFOptions) -> Result<Vec<u8>, GIFWriterError> {
    let mut builder = GIFBuilder::new(Vec::<u8>::new(), width, height, options)?;

    for image in images {
        builder.add_frame(image)?;
    }

    builder.finish()
}

fn adjust_options(options: &ImageWriterOptions) -> Result<GIFOptions, ImageIOError> {
    let delay = options.get_u32(OPTION_DELAY, 0)?;
    if delay > u16::MAX as u32 {
        return Err(ImageIOError::InvalidOptions {
            description: format!("delay should fit into 16 bits, got {}", delay),
        });
    }

    Ok(GIFOptions {
        delay: delay as u16,
        looping: options.get_bool(OPTION_LOOP, false)?,
        max_colors: options.get_u32(OPTION_MAX_COLORS, MAX_COLORS as u32)? as usize,
    })
}
