//! The contract between an analysis stage and the manager which owns its
//! histograms. Registrations happen once, when the stage is constructed; the
//! manager then reads bound parameters after every event.
use crate::parameters::{Parameter, ParameterId, ParameterStore, Variable};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublicationError {
    #[error("Histogram \"{0}\" is already defined")]
    DuplicateHistogram(String),
    #[error("Histogram \"{histogram}\" refers to unbound parameter \"{parameter}\"")]
    UnboundParameter { histogram: String, parameter: String },
    #[error("Histogram \"{histogram}\" has invalid binning: {reason}")]
    InvalidBinning {
        histogram: String,
        reason: &'static str,
    },
    #[error("Summary \"{0}\" has no parameters")]
    EmptySummary(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Binning {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Binning {
    pub const fn new(bins: usize, min: f64, max: f64) -> Self {
        Self { bins, min, max }
    }

    pub fn validate(&self, histogram: &str) -> Result<(), PublicationError> {
        let invalid = |reason| PublicationError::InvalidBinning {
            histogram: histogram.to_owned(),
            reason,
        };
        if self.bins == 0 {
            Err(invalid("number of bins must be positive"))
        } else if !(self.min.is_finite() && self.max.is_finite()) {
            Err(invalid("range must be finite"))
        } else if self.min >= self.max {
            Err(invalid("minimum must be less than maximum"))
        } else {
            Ok(())
        }
    }

    /// Bin holding `value`, or `None` for values outside `[min, max)` and NaN.
    pub fn bin(&self, value: f64) -> Option<usize> {
        if self.bins > 0 && value >= self.min && value < self.max {
            let index = ((value - self.min) / (self.max - self.min) * self.bins as f64) as usize;
            Some(index.min(self.bins - 1))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AxisArgs {
    pub parameter: String,
    #[serde(flatten)]
    pub binning: Binning,
}

/// Declaration of a 1D histogram, or a 2D histogram when `y` is present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HistogramArgs {
    pub name: String,
    pub x: AxisArgs,
    #[serde(default)]
    pub y: Option<AxisArgs>,
}

impl HistogramArgs {
    pub fn new_1d(name: &str, x_parameter: &str, x_binning: Binning) -> Self {
        Self {
            name: name.to_owned(),
            x: AxisArgs {
                parameter: x_parameter.to_owned(),
                binning: x_binning,
            },
            y: None,
        }
    }

    pub fn new_2d(
        name: &str,
        x_parameter: &str,
        x_binning: Binning,
        y_parameter: &str,
        y_binning: Binning,
    ) -> Self {
        Self {
            y: Some(AxisArgs {
                parameter: y_parameter.to_owned(),
                binning: y_binning,
            }),
            ..Self::new_1d(name, x_parameter, x_binning)
        }
    }
}

/// Declaration of a summary: one row per parameter, sharing one value axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryArgs {
    pub name: String,
    pub binning: Binning,
}

impl SummaryArgs {
    pub fn new(name: &str, binning: Binning) -> Self {
        Self {
            name: name.to_owned(),
            binning,
        }
    }
}

/// Implemented by whatever stores and renders histograms for the analysis.
pub trait SpectrumManager {
    fn bind_parameter(&mut self, id: ParameterId, parameter: &Parameter);

    fn bind_variable(&mut self, variable: &Variable);

    fn add_histogram(&mut self, args: HistogramArgs) -> Result<(), PublicationError>;

    fn add_histogram_summary(
        &mut self,
        args: SummaryArgs,
        parameters: &[String],
    ) -> Result<(), PublicationError>;

    /// Called once per event, after the analysis stage has finished with it.
    fn update(&mut self, parameters: &ParameterStore);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binning_edges() {
        let binning = Binning::new(4, 0.0, 8.0);
        assert_eq!(binning.bin(0.0), Some(0));
        assert_eq!(binning.bin(1.99), Some(0));
        assert_eq!(binning.bin(2.0), Some(1));
        assert_eq!(binning.bin(7.99), Some(3));
        assert_eq!(binning.bin(8.0), None);
        assert_eq!(binning.bin(-0.1), None);
        assert_eq!(binning.bin(f64::NAN), None);
    }

    #[test]
    fn invalid_binning() {
        assert!(Binning::new(0, 0.0, 1.0).validate("h").is_err());
        assert!(Binning::new(1, 1.0, 1.0).validate("h").is_err());
        assert!(Binning::new(1, 0.0, f64::INFINITY).validate("h").is_err());
        assert!(Binning::new(16, 0.0, 16.0).validate("h").is_ok());
    }

    #[test]
    fn histogram_args_from_json() {
        let args: HistogramArgs = serde_json::from_str(
            r#"{
                "name": "s1_kin_raw",
                "x": {"parameter": "s1_front_chmax", "bins": 16, "min": 0, "max": 16},
                "y": {"parameter": "s1_back_emax", "bins": 512, "min": 0, "max": 4096}
            }"#,
        )
        .unwrap();
        assert_eq!(
            args,
            HistogramArgs::new_2d(
                "s1_kin_raw",
                "s1_front_chmax",
                Binning::new(16, 0.0, 16.0),
                "s1_back_emax",
                Binning::new(512, 0.0, 4096.0)
            )
        );
    }
}
