//! Recording widget toolkit used by unit tests

extern crate std;

use std::string::{String, ToString};
use std::vec::Vec;

use super::{LabelId, Screen, Widgets};
use crate::metrics::{Metric, QualityLevel};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UiCall {
    SetText(LabelId, String),
    SetAccent(LabelId, QualityLevel),
    AppendSeries(Metric, f32),
    LoadScreen(Screen),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingWidgets {
    pub(crate) calls: Vec<UiCall>,
}

impl RecordingWidgets {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn texts(&self) -> Vec<(LabelId, &str)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                UiCall::SetText(label, text) => Some((*label, text.as_str())),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn series(&self, metric: Metric) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                UiCall::AppendSeries(m, value) if *m == metric => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn screens(&self) -> Vec<Screen> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                UiCall::LoadScreen(screen) => Some(*screen),
                _ => None,
            })
            .collect()
    }
}

impl Widgets for RecordingWidgets {
    type Error = core::convert::Infallible;

    fn set_text(&mut self, label: LabelId, text: &str) -> Result<(), Self::Error> {
        self.calls.push(UiCall::SetText(label, text.to_string()));
        Ok(())
    }

    fn set_accent(&mut self, label: LabelId, level: QualityLevel) -> Result<(), Self::Error> {
        self.calls.push(UiCall::SetAccent(label, level));
        Ok(())
    }

    fn append_series(&mut self, series: Metric, value: f32) -> Result<(), Self::Error> {
        self.calls.push(UiCall::AppendSeries(series, value));
        Ok(())
    }

    fn load_screen(&mut self, screen: Screen) -> Result<(), Self::Error> {
        self.calls.push(UiCall::LoadScreen(screen));
        Ok(())
    }
}
