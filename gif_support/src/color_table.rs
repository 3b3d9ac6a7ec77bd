use gifgen_core::models::{Image, Pixel};

use crate::common::{GIFWriterError, MAX_COLORS, MIN_LZW_CODE_SIZE};

/// Palette of up to 256 colors used to encode one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTable {
    colors: Vec<Pixel>,
}

impl ColorTable {

    pub fn new(colors: Vec<Pixel>) -> Result<Self, GIFWriterError> {
        if colors.is_empty() || colors.len() > MAX_COLORS {
            return Err(GIFWriterError::InvalidFrame {
                description: format!("color table should have between 1 and {} colors, got {}", MAX_COLORS, colors.len()),
            });
        }

        Ok(ColorTable {
            colors,
        })
    }

    pub fn colors(&self) -> &[Pixel] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Number of bits needed to index into the table, at least one.
    pub fn bit_depth(&self) -> u8 {
        let mut bit_depth = 1;
        while (1 << bit_depth) < self.colors.len() {
            bit_depth += 1;
        }

        bit_depth
    }

    /// Number of entries as written to the stream: the table size is encoded as a power of two.
    pub fn encoded_len(&self) -> usize {
        1 << self.bit_depth()
    }

    pub fn lzw_min_code_size(&self) -> u8 {
        self.bit_depth().max(MIN_LZW_CODE_SIZE)
    }

    /// Index of the closest color by euclidean distance in RGB space. Ties go to the lowest index.
    pub fn nearest_color_index(&self, pixel: &Pixel) -> u8 {
        let mut closest = 0;
        let mut closest_distance = u32::MAX;

        for (index, color) in self.colors.iter().enumerate() {
            let distance = color.distance_squared(pixel);

            if distance < closest_distance {
                closest_distance = distance;
                closest = index;

                if distance == 0 {
                    break;
                }
            }
        }

        closest as u8
    }

    /// Maps every pixel of the image to the index of its nearest color, in row-major order.
    pub fn palettize(&self, image: &Image) -> Vec<u8> {
        let mut indices = Vec::with_capacity(image.pixels.len());
        let mut prev: Option<(Pixel, u8)> = None;

        for pixel in &image.pixels {
            // matches previous pixel?
            let index = match prev {
                Some((prev_pixel, prev_index)) if prev_pixel == *pixel => prev_index,
                _ => self.nearest_color_index(pixel),
            };

            indices.push(index);
            prev = Some((*pixel, index));
        }

        indices
    }

    /// RGB triplets padded up to `encoded_len` entries by repeating the last color.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.encoded_len() * 3);

        for color in &self.colors {
            data.push(color.red);
            data.push(color.green);
            data.push(color.blue);
        }

        if let Some(last) = self.colors.last() {
            for _ in self.colors.len()..self.encoded_len() {
                data.push(last.red);
                data.push(last.green);
                data.push(last.blue);
            }
        }

        data
    }
}
