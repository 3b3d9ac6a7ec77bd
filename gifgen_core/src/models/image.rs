use super::{io::ImageIOError, pixel::Pixel};

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Pixel>, // starting at top left pixel of the image, pos = y * width + x
}

impl Image {

    pub fn new(width: usize, height: usize) -> Self {
        Image {
            width,
            height,
            pixels: vec![Pixel::zero(); width as usize * height as usize],
        }
    }

    /// Builds an image from a tightly packed buffer of 8-bit RGB triplets in row-major order.
    pub fn from_rgb_bytes(width: usize, height: usize, data: &[u8]) -> Result<Self, ImageIOError> {
        let expected = width.checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| ImageIOError::FailedToRead {
                description: format!("{}x{} rgb image is too large", width, height),
            })?;
        if data.len() != expected {
            return Err(ImageIOError::FailedToRead {
                description: format!("expected {} bytes for a {}x{} rgb image, got {}", expected, width, height, data.len()),
            });
        }

        let pixels = data.chunks_exact(3)
            .map(|v| Pixel::from_rgb(v[0], v[1], v[2]))
            .collect();

        Ok(Image {
            width,
            height,
            pixels,
        })
    }

    pub fn test_image() -> Self {
        let mut image = Self::new(4, 4);

        let white = Pixel::from_rgb(255, 255, 255);
        let blue = Pixel::from_rgb(3, 155, 229);
        let red = Pixel::from_rgb(221, 47, 47);

        image.fill(white);
        image.set_pixel(1, 1, blue);
        image.set_pixel(2, 1, blue);
        image.set_pixel(1, 2, blue);
        image.set_pixel(2, 2, red);

        image
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: Pixel) {
        self.pixels[y * self.width + x] = pixel;
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }

    pub fn fill(&mut self, color: Pixel) {
        for pixel in self.pixels.iter_mut() {
            *pixel = color;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
