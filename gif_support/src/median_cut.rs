use std::collections::HashMap;

use gifgen_core::models::{Image, Pixel, pixel::Channel};

use crate::{color_table::ColorTable, common::{GIFWriterError, MAX_COLORS}};

// Median cut without the up-front scalar quantization step.
// see https://en.wikipedia.org/wiki/Median_cut
// see Burger & Burge, "Principles of Digital Image Processing: Core Algorithms", chapter 5

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramEntry {
    pub color: Pixel,
    pub count: usize,
}

/// Counts every distinct color of the image, ordered by packed 0xRRGGBB value.
pub fn compute_color_histogram(image: &Image) -> Vec<HistogramEntry> {
    let mut counts: HashMap<Pixel, usize> = HashMap::new();
    for pixel in &image.pixels {
        *counts.entry(*pixel).or_insert(0) += 1;
    }

    let mut histogram: Vec<HistogramEntry> = counts.into_iter()
        .map(|(color, count)| HistogramEntry { color, count })
        .collect();
    histogram.sort_by_key(|v| v.color.packed());

    histogram
}

/// An axis-aligned box in RGB space covering `histogram[start..end]`. Regions own disjoint ranges
/// of one shared histogram and may reorder entries inside their own range.
#[derive(Clone, Debug)]
struct ColorRegion {
    start: usize,
    end: usize,
    level: u32,
    pixel_count: usize,
    min: [u8; 3],
    max: [u8; 3],
}

impl ColorRegion {

    fn new(histogram: &[HistogramEntry], start: usize, end: usize, level: u32) -> Self {
        debug_assert!(start < end && end <= histogram.len());

        let mut region = ColorRegion {
            start,
            end,
            level,
            pixel_count: 0,
            min: [u8::MAX; 3],
            max: [0; 3],
        };
        region.compute_bounds(histogram);

        region
    }

    fn colors(&self) -> usize {
        self.end - self.start
    }

    fn can_split(&self) -> bool {
        self.colors() >= 2
    }

    fn compute_bounds(&mut self, histogram: &[HistogramEntry]) {
        self.min = [u8::MAX; 3];
        self.max = [0; 3];
        self.pixel_count = 0;

        for entry in &histogram[self.start..self.end] {
            self.pixel_count += entry.count;

            for (i, channel) in Channel::all().iter().enumerate() {
                let value = entry.color.channel(*channel);
                self.min[i] = self.min[i].min(value);
                self.max[i] = self.max[i].max(value);
            }
        }
    }

    // ties go to red, then green
    fn widest_channel(&self) -> Channel {
        let mut widest = Channel::Red;
        let mut widest_range = 0;

        for (i, channel) in Channel::all().iter().enumerate() {
            let range = self.max[i] - self.min[i];
            if i == 0 || range > widest_range {
                widest = *channel;
                widest_range = range;
            }
        }

        widest
    }

    /// Sorts the region along its widest channel and cuts it at the pixel-weighted median.
    /// This region keeps the lower part, the upper part is returned.
    fn split(&mut self, histogram: &mut [HistogramEntry]) -> ColorRegion {
        debug_assert!(self.can_split());

        let channel = self.widest_channel();
        histogram[self.start..self.end].sort_by_key(|v| v.color.channel(channel));

        let half = self.pixel_count / 2;
        let mut partition_pixels = 0;
        let mut mid = self.start;
        while partition_pixels < half {
            // all the weight may sit at one end, keep the upper part non-empty
            if mid == self.end - 1 {
                break;
            }

            partition_pixels += histogram[mid].count;
            mid += 1;
        }

        self.level += 1;
        let other = ColorRegion::new(histogram, mid, self.end, self.level);

        self.end = mid;
        self.compute_bounds(histogram);

        other
    }

    /// Average color of the region, weighted by pixel count and rounded to the nearest value.
    fn average_color(&self, histogram: &[HistogramEntry]) -> Pixel {
        let mut sums = [0u64; 3];

        for entry in &histogram[self.start..self.end] {
            for (i, channel) in Channel::all().iter().enumerate() {
                sums[i] += entry.color.channel(*channel) as u64 * entry.count as u64;
            }
        }

        let count = self.pixel_count as u64;
        let average = |sum: u64| ((2 * sum + count) / (2 * count)) as u8;

        Pixel::from_rgb(average(sums[0]), average(sums[1]), average(sums[2]))
    }
}

/// Picks at most `max_colors` representative colors for the image.
///
/// Images that already use few enough colors get exactly those colors, in histogram order.
/// Otherwise the color space is split repeatedly, always picking the splittable region created
/// by the fewest splits, until `max_colors` regions exist. Each region contributes its average.
pub fn median_cut(image: &Image, max_colors: usize) -> Result<ColorTable, GIFWriterError> {
    if max_colors == 0 || max_colors > MAX_COLORS {
        return Err(GIFWriterError::InvalidOptions {
            description: format!("max colors should be in 1..={}, got {}", MAX_COLORS, max_colors),
        });
    }

    if image.is_empty() || image.pixels.is_empty() {
        return Err(GIFWriterError::InvalidFrame {
            description: "can not create a color table for an empty image".to_string(),
        });
    }

    let mut histogram = compute_color_histogram(image);
    trace!("image has {} distinct colors", histogram.len());

    if histogram.len() <= max_colors {
        return ColorTable::new(histogram.iter().map(|v| v.color).collect());
    }

    let mut regions = Vec::with_capacity(max_colors);
    regions.push(ColorRegion::new(&histogram, 0, histogram.len(), 0));

    while regions.len() < max_colors {
        let next = regions.iter()
            .enumerate()
            .filter(|(_, region)| region.can_split())
            .min_by_key(|(_, region)| region.level)
            .map(|(index, _)| index);

        let index = match next {
            Some(v) => v,
            None => break, // every region is down to a single color
        };

        let other = regions[index].split(&mut histogram);
        regions.push(other);
    }

    trace!(
        "median cut produced {} regions, deepest split level is {}",
        regions.len(),
        regions.iter().map(|v| v.level).max().unwrap_or(0)
    );

    ColorTable::new(regions.iter().map(|v| v.average_color(&histogram)).collect())
}
