//! Screen geometry for the 320x240 landscape panel

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::LabelId;
use crate::metrics::Metric;

/// Screen background
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(18 >> 3, 23 >> 2, 24 >> 3);

/// Title bar and chart frame fill
pub const COLOR_FOREGROUND: Rgb565 = Rgb565::new(26 >> 3, 32 >> 2, 33 >> 3);

/// Borders and chart frame
pub const COLOR_STROKE: Rgb565 = Rgb565::new(43 >> 3, 55 >> 2, 57 >> 3);

/// Default text colour
pub const COLOR_TEXT: Rgb565 = Rgb565::new(230 >> 3, 235 >> 2, 235 >> 3);

pub const DISPLAY_WIDTH_PX: u32 = 320;
pub const DISPLAY_HEIGHT_PX: u32 = 240;

/// Outer margin on every side
pub const MARGIN_PX: i32 = 12;

/// Height of the title bar at the top of every screen
pub const TITLE_BAR_HEIGHT_PX: u32 = 32;

/// Height of one metric row on the readings screen
pub const READING_ROW_HEIGHT_PX: u32 = 60;

/// Top of the first metric row on the readings screen
pub const READING_ROWS_TOP_PX: i32 = 44;

/// Column where reading values start
pub const READING_VALUE_X_PX: i32 = 150;

/// Height of a value label (fits the 24 point font)
pub const VALUE_LABEL_HEIGHT_PX: u32 = 32;

/// Top of the min/max line on trend screens
pub const RANGE_LABEL_TOP_PX: i32 = 40;

/// Height of the min/max line on trend screens
pub const RANGE_LABEL_HEIGHT_PX: u32 = 22;

/// Top of the chart on trend screens
pub const CHART_TOP_PX: i32 = 70;

pub fn screen_bounds() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX))
}

pub fn title_area() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(DISPLAY_WIDTH_PX, TITLE_BAR_HEIGHT_PX))
}

/// Top-left corner of a metric row on the readings screen.
pub fn reading_row_origin(metric: Metric) -> Point {
    Point::new(
        MARGIN_PX,
        READING_ROWS_TOP_PX + (metric.index() as u32 * READING_ROW_HEIGHT_PX) as i32,
    )
}

/// Area a label occupies on its screen. Cleared before each redraw.
pub fn label_area(label: LabelId) -> Rectangle {
    match label {
        LabelId::Reading(metric) => {
            let row = reading_row_origin(metric);
            Rectangle::new(
                Point::new(READING_VALUE_X_PX, row.y),
                Size::new(
                    DISPLAY_WIDTH_PX - READING_VALUE_X_PX as u32 - MARGIN_PX as u32,
                    VALUE_LABEL_HEIGHT_PX,
                ),
            )
        }
        LabelId::Range(_) => Rectangle::new(
            Point::new(MARGIN_PX, RANGE_LABEL_TOP_PX),
            Size::new(DISPLAY_WIDTH_PX - 2 * MARGIN_PX as u32, RANGE_LABEL_HEIGHT_PX),
        ),
    }
}

/// Plot area of the trend chart.
pub fn chart_area() -> Rectangle {
    Rectangle::new(
        Point::new(MARGIN_PX, CHART_TOP_PX),
        Size::new(
            DISPLAY_WIDTH_PX - 2 * MARGIN_PX as u32,
            DISPLAY_HEIGHT_PX - CHART_TOP_PX as u32 - MARGIN_PX as u32,
        ),
    )
}
