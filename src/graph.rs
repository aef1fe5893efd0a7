#![cfg(feature = "web")]
use std::error::Error;
use std::io::Cursor;
use std::ops::Range;

use image::{ImageOutputFormat, RgbImage};
use plotters::prelude::*;

use crate::chart::{ChartConfig, ChartKind, RenderSink};

/// Rasterizes chart configurations to PNG images
///
/// This sink draws a chart configuration with the plotters bitmap backend,
/// so the server can serve charts as plain images.
///
/// # Implementation Notes
/// * Draws into an in-memory RGB buffer and encodes it as PNG
/// * Bars are filled, lines are stroked, both in the dataset colour
/// * The y axis always includes zero
#[derive(Clone, Debug)]
pub struct PngSink {
    /// Width of the image in pixels
    pub width: u32,

    /// Height of the image in pixels
    pub height: u32,
}

impl Default for PngSink {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl RenderSink for PngSink {
    type Output = Vec<u8>;
    type Error = Box<dyn Error>;

    fn draw(&mut self, config: &ChartConfig) -> Result<Vec<u8>, Box<dyn Error>> {
        let (width, height) = (self.width, self.height);
        let dataset = config
            .data
            .datasets
            .first()
            .ok_or("chart has no dataset")?;
        let labels = &config.data.labels;
        let slots = labels.len().max(dataset.data.len()).max(1);
        let color = dataset
            .background_color
            .as_deref()
            .or(dataset.border_color.as_deref())
            .and_then(parse_hex_color)
            .unwrap_or(BLUE);

        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&dataset.label, ("sans-serif", 30).into_font())
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(40)
                .build_cartesian_2d(0f64..slots as f64, value_range(&dataset.data))?;

            chart
                .configure_mesh()
                .x_desc(&config.options.scales.x.title.text)
                .y_desc(&config.options.scales.y.title.text)
                .x_labels(slots)
                .x_label_formatter(&|x| label_at(labels, *x))
                .draw()?;

            match config.kind {
                ChartKind::Bar => {
                    chart.draw_series(dataset.data.iter().enumerate().map(|(i, &v)| {
                        let x = i as f64;
                        Rectangle::new([(x + 0.1, 0.0), (x + 0.9, v)], color.filled())
                    }))?;
                }
                ChartKind::Line => {
                    chart.draw_series(LineSeries::new(
                        dataset
                            .data
                            .iter()
                            .enumerate()
                            .map(|(i, &v)| (i as f64 + 0.5, v)),
                        &color,
                    ))?;
                }
            }

            root.present()?;
        }

        let image = RgbImage::from_raw(width, height, pixels).ok_or("pixel buffer size mismatch")?;
        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageOutputFormat::Png)?;
        Ok(png.into_inner())
    }
}

/// Y range covering every value and zero, with a little headroom.
fn value_range(values: &[f64]) -> Range<f64> {
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return min..min + 1.0;
    }
    let pad = (max - min) * 0.05;
    let low = if min < 0.0 { min - pad } else { min };
    low..max + pad
}

fn label_at(labels: &[String], x: f64) -> String {
    if x < 0.0 {
        return String::new();
    }
    labels.get(x.floor() as usize).cloned().unwrap_or_default()
}

/// Parses `#RRGGBB` colours.
fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dashboard_colours() {
        assert_eq!(parse_hex_color("#007AFF"), Some(RGBColor(0, 122, 255)));
        assert_eq!(parse_hex_color("#4caf50"), Some(RGBColor(76, 175, 80)));
        assert_eq!(parse_hex_color("blue"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn range_always_contains_zero() {
        let range = value_range(&[5.0, 10.0]);
        assert_eq!(range.start, 0.0);
        assert!(range.end > 10.0);

        let range = value_range(&[-4.0, 2.0]);
        assert!(range.start < -4.0);
        assert!(range.end > 2.0);
    }

    #[test]
    fn flat_series_gets_a_unit_range() {
        assert_eq!(value_range(&[]), 0.0..1.0);
        assert_eq!(value_range(&[0.0, 0.0]), 0.0..1.0);
    }

    #[test]
    fn labels_map_to_slots() {
        let labels = vec!["Mon".to_string(), "Tue".to_string()];
        assert_eq!(label_at(&labels, 0.0), "Mon");
        assert_eq!(label_at(&labels, 1.7), "Tue");
        assert_eq!(label_at(&labels, 2.0), "");
        assert_eq!(label_at(&labels, -1.0), "");
    }
}
