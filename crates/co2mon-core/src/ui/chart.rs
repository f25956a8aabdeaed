//! Autoscaling line chart for one metric's recent history

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};
use heapless::Vec;

use super::layout::{COLOR_FOREGROUND, COLOR_STROKE};
use crate::config::HISTORY_CAPACITY;

/// Inner padding between the frame and the plotted line
const PLOT_PADDING_PX: u32 = 6;

/// Smallest vertical span; flat series are drawn centred in this range
const MIN_SPAN: f32 = 1.0;

pub struct Chart {
    area: Rectangle,
    color: Rgb565,
}

impl Chart {
    pub const fn new(area: Rectangle, color: Rgb565) -> Self {
        Self { area, color }
    }

    fn plot_area(&self) -> Rectangle {
        self.area.offset(-(PLOT_PADDING_PX as i32))
    }

    /// Clear the chart area and draw `values` (oldest first) as a polyline.
    ///
    /// The x axis always spans [`HISTORY_CAPACITY`] points so a partially
    /// filled history grows from the left.
    pub fn draw<D, I>(&self, values: I, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        I: IntoIterator<Item = f32>,
    {
        self.area
            .into_styled(PrimitiveStyle::with_fill(COLOR_FOREGROUND))
            .draw(display)?;
        self.area
            .into_styled(PrimitiveStyle::with_stroke(COLOR_STROKE, 1))
            .draw(display)?;

        let values: Vec<f32, HISTORY_CAPACITY> = values
            .into_iter()
            .filter(|v| v.is_finite())
            .take(HISTORY_CAPACITY)
            .collect();
        let Some((min, max)) = bounds(&values) else {
            return Ok(());
        };

        let plot = self.plot_area();
        let points: Vec<Point, HISTORY_CAPACITY> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                Point::new(
                    x_position(i, plot),
                    scale(*value, min, max, plot.top_left.y, plot.size.height),
                )
            })
            .collect();

        if let [only] = points.as_slice() {
            return Circle::with_center(*only, 5)
                .into_styled(PrimitiveStyle::with_fill(self.color))
                .draw(display);
        }

        let line_style = PrimitiveStyle::with_stroke(self.color, 2);
        for pair in points.windows(2) {
            Line::new(pair[0], pair[1])
                .into_styled(line_style)
                .draw(display)?;
        }

        Ok(())
    }
}

/// Min/max of `values`, widened to at least [`MIN_SPAN`].
fn bounds(values: &[f32]) -> Option<(f32, f32)> {
    let first = *values.first()?;
    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

    if max - min < MIN_SPAN {
        let centre = (min + max) / 2.0;
        Some((centre - MIN_SPAN / 2.0, centre + MIN_SPAN / 2.0))
    } else {
        Some((min, max))
    }
}

fn x_position(index: usize, plot: Rectangle) -> i32 {
    let step = plot.size.width as f32 / (HISTORY_CAPACITY - 1) as f32;
    plot.top_left.x + (index as f32 * step) as i32
}

/// Map `value` in `min..=max` to a screen row. Larger values are higher up.
pub(crate) fn scale(value: f32, min: f32, max: f32, top: i32, height: u32) -> i32 {
    let span = max - min;
    let norm = if span > 0.0 {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };
    top + ((1.0 - norm) * height.saturating_sub(1) as f32) as i32
}
