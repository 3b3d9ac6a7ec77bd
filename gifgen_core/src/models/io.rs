use std::collections::HashMap;

use custom_error::custom_error;

use super::image::Image;

custom_error! {pub ImageIOError
    FailedToRead {description: String} = "Failed to read image: {description}",
    FailedToWrite {description: String} = "Failed to write image: {description}",
    InvalidOptions {description: String} = "Invalid options are set for this io operation: {description}",
}

pub trait ImageReader {

    fn read(&self, data: &[u8]) -> Result<Vec<Image>, ImageIOError>;
}

pub trait ImageWriter {

    fn write(&self, image: &Image, options: &ImageWriterOptions) -> Result<Vec<u8>, ImageIOError>;
}

#[derive(Clone, Debug, Default)]
pub struct ImageWriterOptions {

    options: HashMap<String, String>,
}

impl ImageWriterOptions {

    pub fn with_option(&self, key: &str, value: &str) -> Self {
        let mut options = self.options.clone();
        options.insert(key.to_string(), value.to_string());

        Self {
            options,
        }
    }

    pub fn with_option_u32(&self, key: &str, value: u32) -> Self {
        self.with_option(&key, &value.to_string())
    }

    pub fn with_option_bool(&self, key: &str, value: bool) -> Self {
        self.with_option(&key, if value {
            "true"
        } else {
            "false"
        })
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ImageIOError> {
        let value = match self.options.get(key) {
            Some(v) => v,
            None => return Ok(default),
        };

        match value.to_lowercase().trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ImageIOError::InvalidOptions {
                description: format!("failed to parse option value as a bool: {}", other),
            })
        }
    }

    pub fn get_u32(&self, key: &str, default: u32) -> Result<u32, ImageIOError> {
        let value = match self.options.get(key) {
            Some(v) => v,
            None => return Ok(default),
        };

        value.trim().parse().map_err(|err| ImageIOError::InvalidOptions {
            description: format!("failed to parse option {} as u32: {}", key, err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = ImageWriterOptions::default();

        assert_eq!(options.get_u32("delay", 7).expect("failed to get u32"), 7);
        assert_eq!(options.get_bool("loop", true).expect("failed to get bool"), true);
    }

    #[test]
    fn test_options_typed_values() {
        let options = ImageWriterOptions::default()
            .with_option_u32("delay", 25)
            .with_option_bool("loop", false);

        assert_eq!(options.get_u32("delay", 0).expect("failed to get u32"), 25);
        assert_eq!(options.get_bool("loop", true).expect("failed to get bool"), false);
    }

    #[test]
    fn test_options_invalid_values() {
        let options = ImageWriterOptions::default()
            .with_option("delay", "soon")
            .with_option("loop", "maybe");

        assert!(options.get_u32("delay", 0).is_err());
        assert!(options.get_bool("loop", false).is_err());
    }
}
