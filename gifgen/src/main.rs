#[macro_use]
extern crate log;
extern crate custom_error;

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter};

use custom_error::custom_error;
use env_logger::Env;

use gif_support::{GIFBuilder, GIFOptions, GIFWriterError};
use gif_support::common::MAX_COLORS;
use gifgen_core::models::{ImageIOError, ImageReader};
use gifgen_core::utils::print_intro;
use ppm_support::{read_dimensions, PPMReader, PPMReaderError};

const DEFAULT_LOGGING_LEVEL: &str = "info";
const DEFAULT_OUTPUT: &str = "result.gif";

custom_error! {CliError
    MissingArgument {name: String} = "missing required argument --{name}",
    InvalidArgument {name: String, value: String} = "invalid value for --{name}: \"{value}\"",
    Read {path: String, source: io::Error} = "failed to read {path}: {source}",
    Header {path: String, source: PPMReaderError} = "{path} is not a supported ppm file: {source}",
    Decode {path: String, source: ImageIOError} = "failed to decode {path}: {source}",
    TooLarge {path: String, width: usize, height: usize} = "{path} is {width}x{height}, gif frames are limited to 65535x65535",
    SizeMismatch {path: String, width: usize, height: usize, expected_width: usize, expected_height: usize}
        = "{path} is {width}x{height}, expected {expected_width}x{expected_height} like the first frame",
    Write {source: GIFWriterError} = "failed to write gif: {source}",
}

#[derive(Debug, PartialEq)]
struct Config {
    frames: Vec<String>,
    output: String,
    options: GIFOptions,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_LOGGING_LEVEL)).init();
    print_intro();

    let args: Vec<String> = env::args().collect();
    debug!("args are: {:?}", args);

    let config = match parse_config(&args) {
        Ok(v) => v,
        Err(err) => {
            error!("{}", err);
            error!("please specify frames to encode, for example:\ngifgen --frames=a.ppm,b.ppm --output=result.gif --delay=10 --loop=true --max-colors=256");
            std::process::exit(1);
        }
    };

    if let Err(err) = encode_frames(&config) {
        error!("{}", err);
        std::process::exit(1);
    }

    info!("Result saved to {}", config.output);
}

fn parse_config(args: &[String]) -> Result<Config, CliError> {
    let frames: Vec<String> = argument_value(args, "frames")
        .ok_or_else(|| CliError::MissingArgument { name: "frames".to_string() })?
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect();

    if frames.is_empty() {
        return Err(CliError::InvalidArgument { name: "frames".to_string(), value: String::new() });
    }

    let mut options = GIFOptions::default();
    if let Some(delay) = argument_value(args, "delay") {
        options.delay = parse_argument("delay", &delay)?;
    }
    if let Some(max_colors) = argument_value(args, "max-colors") {
        options.max_colors = parse_argument("max-colors", &max_colors)?;
        if options.max_colors == 0 || options.max_colors > MAX_COLORS {
            return Err(CliError::InvalidArgument { name: "max-colors".to_string(), value: max_colors });
        }
    }
    options.looping = match argument_value(args, "loop") {
        Some(v) => parse_argument("loop", &v)?,
        None => frames.len() > 1,
    };

    Ok(Config {
        frames,
        output: argument_value(args, "output").unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        options,
    })
}

fn parse_argument<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::InvalidArgument {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn argument_value(args: &[String], argument_name: &str) -> Option<String> {
    let prefix = format!("--{}=", argument_name);
    args.iter()
        .find(|s| s.starts_with(&prefix))
        .map(|s| s[prefix.len()..].to_string())
}

// every frame header is checked before the output file is created
fn check_frames(frames: &[String]) -> Result<(usize, usize), CliError> {
    let mut expected: Option<(usize, usize)> = None;

    for path in frames {
        let data = fs::read(path).map_err(|source| CliError::Read { path: path.clone(), source })?;
        let (width, height) = read_dimensions(&data).map_err(|source| CliError::Header { path: path.clone(), source })?;
        debug!("{} is {}x{}", path, width, height);

        if width > u16::MAX as usize || height > u16::MAX as usize {
            return Err(CliError::TooLarge { path: path.clone(), width, height });
        }

        match expected {
            None => expected = Some((width, height)),
            Some((expected_width, expected_height)) if expected_width != width || expected_height != height => {
                return Err(CliError::SizeMismatch {
                    path: path.clone(),
                    width,
                    height,
                    expected_width,
                    expected_height,
                });
            },
            Some(_) => {},
        }
    }

    expected.ok_or_else(|| CliError::InvalidArgument { name: "frames".to_string(), value: String::new() })
}

fn encode_frames(config: &Config) -> Result<(), CliError> {
    let (width, height) = check_frames(&config.frames)?;
    info!("encoding {} frame{} of {}x{} into {}",
        config.frames.len(), if config.frames.len() > 1 { "s" } else { "" }, width, height, config.output);

    let file = File::create(&config.output)
        .map_err(|source| CliError::Write { source: GIFWriterError::IO { source } })?;
    let mut builder = GIFBuilder::new(BufWriter::new(file), width, height, config.options)?;
    let reader = PPMReader::new();

    for path in &config.frames {
        let data = fs::read(path).map_err(|source| CliError::Read { path: path.clone(), source })?;
        let images = reader.read(&data).map_err(|source| CliError::Decode { path: path.clone(), source })?;

        for image in images {
            info!("adding frame #{} from {}", builder.frames_written(), path);
            builder.add_frame(&image)?;
        }
    }

    builder.finish()?;
    Ok(())
}
