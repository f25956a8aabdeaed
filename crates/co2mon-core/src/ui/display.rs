//! [`Widgets`] implementation that renders to an `embedded-graphics` target

use core::fmt::Debug;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::PrimitiveStyle;
use embedded_graphics::text::{Baseline, Text};
use heapless::{Deque, String};
use profont::{PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use super::chart::Chart;
use super::layout::{
    COLOR_BACKGROUND, COLOR_FOREGROUND, COLOR_TEXT, MARGIN_PX, chart_area, label_area,
    reading_row_origin, title_area,
};
use super::{LabelId, Screen, Widgets};
use crate::config::HISTORY_CAPACITY;
use crate::metrics::{Metric, QualityLevel};

/// Longest label text kept; longer text is truncated.
pub const LABEL_CAPACITY: usize = 32;

/// Retained-mode widget state drawn onto `D`.
///
/// Every label and series is stored whether or not its screen is visible,
/// and only mutations that touch the active screen are drawn immediately.
pub struct DisplayWidgets<D> {
    display: D,
    active: Option<Screen>,
    texts: [String<LABEL_CAPACITY>; LabelId::COUNT],
    accents: [Option<QualityLevel>; LabelId::COUNT],
    series: [Deque<f32, HISTORY_CAPACITY>; Metric::ALL.len()],
}

impl<D> DisplayWidgets<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    /// Wrap a display. Nothing is drawn until the first [`Widgets::load_screen`].
    pub const fn new(display: D) -> Self {
        Self {
            display,
            active: None,
            texts: [const { String::new() }; LabelId::COUNT],
            accents: [None; LabelId::COUNT],
            series: [const { Deque::new() }; Metric::ALL.len()],
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn active_screen(&self) -> Option<Screen> {
        self.active
    }

    pub fn text(&self, label: LabelId) -> &str {
        self.texts[label.index()].as_str()
    }

    pub fn accent(&self, label: LabelId) -> Option<QualityLevel> {
        self.accents[label.index()]
    }

    /// Charted values for `metric`, oldest first.
    pub fn series(&self, metric: Metric) -> impl Iterator<Item = f32> + '_ {
        self.series[metric.index()].iter().copied()
    }

    fn is_visible(&self, label: LabelId) -> bool {
        self.active == Some(label.screen())
    }

    fn text_color(&self, label: LabelId) -> Rgb565 {
        self.accent(label).map_or(COLOR_TEXT, QualityLevel::color)
    }

    fn draw_label(&mut self, label: LabelId) -> Result<(), D::Error> {
        let area = label_area(label);
        area.into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(&mut self.display)?;

        let font = match label {
            LabelId::Reading(_) => &PROFONT_24_POINT,
            LabelId::Range(_) => &PROFONT_14_POINT,
        };
        let style = MonoTextStyle::new(font, self.text_color(label));
        Text::with_baseline(
            self.texts[label.index()].as_str(),
            area.top_left,
            style,
            Baseline::Top,
        )
        .draw(&mut self.display)?;
        Ok(())
    }

    fn draw_chart(&mut self, metric: Metric) -> Result<(), D::Error> {
        let color = self.text_color(LabelId::Reading(metric));
        let chart = Chart::new(chart_area(), color);
        let values = &self.series[metric.index()];
        chart.draw(values.iter().copied(), &mut self.display)
    }

    fn draw_screen(&mut self, screen: Screen) -> Result<(), D::Error> {
        self.display.clear(COLOR_BACKGROUND)?;

        title_area()
            .into_styled(PrimitiveStyle::with_fill(COLOR_FOREGROUND))
            .draw(&mut self.display)?;
        Text::with_baseline(
            screen.title(),
            Point::new(MARGIN_PX, 7),
            MonoTextStyle::new(&PROFONT_18_POINT, COLOR_TEXT),
            Baseline::Top,
        )
        .draw(&mut self.display)?;

        match screen.trend_metric() {
            None => {
                let caption_style = MonoTextStyle::new(&PROFONT_14_POINT, COLOR_TEXT);
                for metric in Metric::ALL {
                    let origin = reading_row_origin(metric) + Point::new(0, 8);
                    Text::with_baseline(metric.label(), origin, caption_style, Baseline::Top)
                        .draw(&mut self.display)?;
                    self.draw_label(LabelId::Reading(metric))?;
                }
            }
            Some(metric) => {
                self.draw_label(LabelId::Range(metric))?;
                self.draw_chart(metric)?;
            }
        }

        Ok(())
    }
}

impl<D> Widgets for DisplayWidgets<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    type Error = D::Error;

    fn set_text(&mut self, label: LabelId, text: &str) -> Result<(), Self::Error> {
        let entry = &mut self.texts[label.index()];
        if entry.as_str() == text {
            return Ok(());
        }

        entry.clear();
        for ch in text.chars() {
            if entry.push(ch).is_err() {
                break;
            }
        }

        if self.is_visible(label) {
            self.draw_label(label)?;
        }
        Ok(())
    }

    fn set_accent(&mut self, label: LabelId, level: QualityLevel) -> Result<(), Self::Error> {
        let slot = &mut self.accents[label.index()];
        if *slot == Some(level) {
            return Ok(());
        }
        *slot = Some(level);

        if self.is_visible(label) {
            self.draw_label(label)?;
        }
        Ok(())
    }

    fn append_series(&mut self, series: Metric, value: f32) -> Result<(), Self::Error> {
        let points = &mut self.series[series.index()];
        if points.is_full() {
            points.pop_front();
        }
        // Cannot fail: a slot was freed above
        let _ = points.push_back(value);

        if self.active == Some(Screen::trend(series)) {
            self.draw_chart(series)?;
        }
        Ok(())
    }

    fn load_screen(&mut self, screen: Screen) -> Result<(), Self::Error> {
        self.active = Some(screen);
        self.draw_screen(screen)
    }
}
