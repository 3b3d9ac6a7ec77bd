use std::str::from_utf8;

use byteorder::{BigEndian, ByteOrder};
use custom_error::custom_error;

use gifgen_core::models::{Image, ImageIOError, ImageReader, Pixel};

// see http://netpbm.sourceforge.net/doc/ppm.html

custom_error! {pub PPMReaderError
    InvalidHeader {description: String} = "Invalid header: {description}",
    InvalidRaster {description: String} = "Invalid raster: {description}",
    NotImplemented {description: String} = "Not implemented: {description}"
}

#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub magic_number: String,
    pub width: usize,
    pub height: usize,
    pub max_color_value: usize,
}

trait RasterReader {
    fn read_raster(&self, header: &Header, data: &[u8]) -> Result<Vec<Pixel>, PPMReaderError>;
}

// plain format, samples are ascii decimal numbers
struct P3RasterReader {
}

impl RasterReader for P3RasterReader {
    fn read_raster(&self, header: &Header, mut data: &[u8]) -> Result<Vec<Pixel>, PPMReaderError> {
        // the smallest plain sample is one digit and one separator
        let mut pixels = Vec::with_capacity((header.width * header.height).min(data.len() / 6 + 1));
        let normalize = get_normalize_fn(header.max_color_value);

        for _ in 0..header.width * header.height {
            let mut channels = [0u8; 3];

            for channel in channels.iter_mut() {
                data = skip_whitespaces_and_comments(data);
                if data.is_empty() {
                    return Err(PPMReaderError::InvalidRaster {
                        description: format!("expected {} pixels, got {}", header.width * header.height, pixels.len()),
                    });
                }

                let (value, rest) = read_number(data)?;
                *channel = normalize(value)?;
                data = rest;
            }

            pixels.push(Pixel::from_rgb(channels[0], channels[1], channels[2]));
        }

        Ok(pixels)
    }
}

// raw format, one byte per sample or two big endian bytes when max value is above 255
struct P6RasterReader {
}

impl RasterReader for P6RasterReader {
    fn read_raster(&self, header: &Header, data: &[u8]) -> Result<Vec<Pixel>, PPMReaderError> {
        let sample_size = if header.max_color_value < 256 { 1 } else { 2 };
        let expected = header.width * header.height * 3 * sample_size;
        if data.len() < expected {
            return Err(PPMReaderError::InvalidRaster {
                description: format!("expected {} bytes of raster data, got {}", expected, data.len()),
            });
        }

        let normalize = get_normalize_fn(header.max_color_value);
        let read_sample = |offset: usize| if sample_size == 1 {
            data[offset] as usize
        } else {
            BigEndian::read_u16(&data[offset..offset + 2]) as usize
        };

        data[..expected].chunks_exact(3 * sample_size)
            .enumerate()
            .map(|(i, _)| {
                let offset = i * 3 * sample_size;
                Ok(Pixel::from_rgb(
                    normalize(read_sample(offset))?,
                    normalize(read_sample(offset + sample_size))?,
                    normalize(read_sample(offset + 2 * sample_size))?,
                ))
            })
            .collect()
    }
}

fn get_raster_reader(magic_number: &str) -> Result<Box<dyn RasterReader>, PPMReaderError> {
    match magic_number {
        "P3" => Ok(Box::new(P3RasterReader {})),
        "P6" => Ok(Box::new(P6RasterReader {})),
        other => Err(PPMReaderError::NotImplemented {
            description: format!("Current PPM reader does not support {} magic number for PPM format.", other),
        }),
    }
}

fn get_normalize_fn(max_value: usize) -> Box<dyn Fn(usize) -> Result<u8, PPMReaderError>> {
    Box::new(move |x| if x > max_value {
        Err(PPMReaderError::InvalidRaster {
            description: format!("sample value {} is above max value {}", x, max_value),
        })
    } else {
        Ok((255 * x / max_value) as u8)
    })
}

fn is_whitespace(char: u8) -> bool {
    // 9 - TAB; 10 - LF; 11 - VT; 12 - FF; 13 - CR; 32 - SPACE;
    char == 9 || char == 10 || char == 11 || char == 12 || char == 13 || char == 32
}

fn read_number(data: &[u8]) -> Result<(usize, &[u8]), PPMReaderError> {
    let mut i = 0;
    while data.len() > i && data[i].is_ascii_digit() {
        i += 1;
    }

    if i == 0 || (i < data.len() && !is_whitespace(data[i]) && data[i] != b'#') {
        return Err(PPMReaderError::InvalidHeader {
            description: format!("expected a number, got {:?}", String::from_utf8_lossy(&data[..(i + 1).min(data.len())])),
        });
    }

    // only ascii digits at this point
    let value = from_utf8(&data[0..i]).ok()
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| PPMReaderError::InvalidHeader {
            description: "number is too large".to_string(),
        })?;

    Ok((value, &data[i..]))
}

fn skip_whitespaces_and_comments(mut data: &[u8]) -> &[u8] {
    loop {
        match data.first() {
            Some(v) if is_whitespace(*v) => data = &data[1..],
            // 35 - #, comment runs until the end of line
            Some(35) => {
                data = match data.iter().position(|v| *v == 10 || *v == 13) {
                    Some(end) => &data[end..],
                    None => &data[data.len()..],
                };
            },
            _ => return data,
        }
    }
}

fn read_header_field<'a>(data: &'a [u8], name: &str) -> Result<(usize, &'a [u8]), PPMReaderError> {
    let data = skip_whitespaces_and_comments(data);
    if data.is_empty() {
        return Err(PPMReaderError::InvalidHeader {
            description: format!("unexpected end of data while reading {}", name),
        });
    }

    read_number(data)
}

/// Parses the header and returns it with the raster data that follows it.
pub fn read_header(data: &[u8]) -> Result<(Header, &[u8]), PPMReaderError> {
    if data.len() < 2 {
        return Err(PPMReaderError::InvalidHeader {
            description: "data is too short for a PPM header".to_string(),
        });
    }

    let magic_number = from_utf8(&data[0..2]).map_err(|_| PPMReaderError::InvalidHeader {
        description: format!("Bad data for magic number in PPM header: {:x?}", &data[0..2]),
    })?;

    let (width, data) = read_header_field(&data[2..], "width")?;
    let (height, data) = read_header_field(data, "height")?;
    let (max_color_value, data) = read_header_field(data, "max color value")?;

    if width == 0 || height == 0 {
        return Err(PPMReaderError::InvalidHeader {
            description: format!("image should not be empty, got {}x{}", width, height),
        });
    }

    // raster size in bytes at two bytes per sample must fit into usize
    if width.checked_mul(height).and_then(|v| v.checked_mul(6)).is_none() {
        return Err(PPMReaderError::InvalidHeader {
            description: format!("image dimensions {}x{} are too large", width, height),
        });
    }

    if max_color_value == 0 || max_color_value > 65535 {
        return Err(PPMReaderError::InvalidHeader {
            description: format!("max color value should be in 1..=65535, got {}", max_color_value),
        });
    }

    // exactly one whitespace separates the header from the raster
    let data = match data.first() {
        Some(v) if is_whitespace(*v) => &data[1..],
        _ => return Err(PPMReaderError::InvalidHeader {
            description: "expected whitespace after max color value".to_string(),
        }),
    };

    Ok((Header {
        magic_number: magic_number.to_owned(),
        width,
        height,
        max_color_value,
    }, data))
}

/// Reads only as much as needed to know the image size.
pub fn read_dimensions(data: &[u8]) -> Result<(usize, usize), PPMReaderError> {
    let (header, _) = read_header(data)?;
    get_raster_reader(&header.magic_number)?;

    Ok((header.width, header.height))
}

fn read_ppm(data: &[u8]) -> Result<Image, PPMReaderError> {
    let (header, data) = read_header(data)?;
    let raster_reader = get_raster_reader(&header.magic_number)?;
    let pixels = raster_reader.read_raster(&header, data)?;

    Ok(Image {
        width: header.width,
        height: header.height,
        pixels,
    })
}

pub struct PPMReader {
}

impl PPMReader {
    pub const fn new() -> Self {
        PPMReader {}
    }
}

impl ImageReader for PPMReader {

    fn read(&self, data: &[u8]) -> Result<Vec<Image>, ImageIOError> {
        let image = read_ppm(data).map_err(|err| ImageIOError::FailedToRead {
            description: format!("failed to read ppm: {}", err),
        })?;

        Ok(vec![image])
    }
}

#[cfg(test)]
mod tests {
    use std::fs::read;
    use super::*;

    fn read_single(data: &[u8]) -> Image {
        let mut images = PPMReader::new().read(data).expect("Failed to read the image");
        assert_eq!(images.len(), 1);
        images.remove(0)
    }

    #[test]
    fn simple_test() {
        let simple_ppm = read("assets/simple.ppm")
            .expect("Failed to load assets/simple.ppm");
        let image = read_single(&simple_ppm);

        assert_eq!(image.width, 4);
        assert_eq!(image.height, 4);
        assert_eq!(image.pixels.len(), 16);
        assert_eq!(image, Image::test_image());
    }

    #[test]
    fn test_read_dimensions() {
        let simple_ppm = read("assets/simple.ppm")
            .expect("Failed to load assets/simple.ppm");

        assert_eq!(read_dimensions(&simple_ppm).expect("failed to read dimensions"), (4, 4));
    }

    #[test]
    fn test_p6() {
        let mut data = b"P6\n2 1\n255\n".to_vec();
        data.extend_from_slice(&[1, 2, 3, 250, 251, 252]);

        let image = read_single(&data);
        assert_eq!(image.pixels, vec![Pixel::from_rgb(1, 2, 3), Pixel::from_rgb(250, 251, 252)]);
    }

    #[test]
    fn test_p6_binary_sample_looks_like_whitespace() {
        let mut data = b"P6 1 1 255 ".to_vec();
        data.extend_from_slice(&[10, 32, 9]);

        let image = read_single(&data);
        assert_eq!(image.pixels, vec![Pixel::from_rgb(10, 32, 9)]);
    }

    #[test]
    fn test_p6_wide_samples() {
        let mut data = b"P6\n1 1\n65535\n".to_vec();
        data.extend_from_slice(&[0xFF, 0xFF, 0x00, 0x00, 0x80, 0x00]);

        let image = read_single(&data);
        assert_eq!(image.pixels, vec![Pixel::from_rgb(255, 0, 127)]);
    }

    #[test]
    fn test_normalization() {
        let image = read_single(b"P3 2 1 15 15 0 5  0 15 10");
        assert_eq!(image.pixels, vec![Pixel::from_rgb(255, 0, 85), Pixel::from_rgb(0, 255, 170)]);
    }

    #[test]
    fn test_comments_between_fields() {
        let image = read_single(b"P3 # comment\n1 # width\n1\n# max value next\n255\n1 2 3\n");
        assert_eq!(image.pixels, vec![Pixel::from_rgb(1, 2, 3)]);
    }

    #[test]
    fn test_truncated_raster() {
        assert!(PPMReader::new().read(b"P3 2 2 255 1 2 3 4 5 6").is_err());

        let mut data = b"P6 2 2 255\n".to_vec();
        data.extend_from_slice(&[0; 11]);
        assert!(PPMReader::new().read(&data).is_err());
    }

    #[test]
    fn test_invalid_headers() {
        assert!(PPMReader::new().read(b"P").is_err());
        assert!(PPMReader::new().read(b"P3 4").is_err());
        assert!(PPMReader::new().read(b"P3 0 4 255 ").is_err());
        assert!(PPMReader::new().read(b"P3 x 4 255 ").is_err());
        assert!(PPMReader::new().read(b"P3 1 1 0 1 1 1").is_err());
        assert!(PPMReader::new().read(b"P3 1 1 255 256 0 0").is_err());
    }

    #[test]
    fn test_huge_dimensions() {
        match read_dimensions(b"P6 4294967296 4294967296 255\n\x01\x02\x03") {
            Err(PPMReaderError::InvalidHeader { .. }) => {},
            other => panic!("expected invalid header error, got {:?}", other),
        }
        assert!(PPMReader::new().read(b"P6 4294967296 4294967296 255\n\x01\x02\x03").is_err());
        assert!(PPMReader::new().read(b"P6 65535 65535 255\n\x01\x02\x03").is_err());
    }

    #[test]
    fn test_large_plain_image_with_little_data() {
        assert_eq!(read_dimensions(b"P3 65535 65535 255\n1 2 3").expect("failed to read dimensions"), (65535, 65535));
        assert!(PPMReader::new().read(b"P3 65535 65535 255\n1 2 3").is_err());
    }

    #[test]
    fn test_unsupported_format() {
        match read_dimensions(b"P2 1 1 255 0") {
            Err(PPMReaderError::NotImplemented { .. }) => {},
            other => panic!("expected not implemented error, got {:?}", other),
        }
    }
}
