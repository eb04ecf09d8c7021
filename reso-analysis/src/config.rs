use crate::{
    channel_map::{BoardBank, BoardKind},
    detector::{EnergyCalibration, SiliconDetectorConfig},
    geometry::DetectorGeometry,
    kinematics::DecayMasses,
    publication::{Binning, HistogramArgs},
    reaction::ReactionSettings,
};
use serde::Deserialize;
use specter_common::BoardId;
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

/// Default mesytec MTDC tick length, set in the DAQ configuration.
pub const DEFAULT_TICKS_TO_NS: f64 = 0.0625;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimingConfig {
    pub board: BoardId,
    pub ticks_to_ns: f64,
}

/// Inputs of the decay Q-value estimate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DecayConfig {
    /// Silicon detector which sees the light fragment.
    pub detector: String,
    pub masses: DecayMasses,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnalysisConfig {
    pub banks: Vec<BoardBank>,
    pub timing: Option<TimingConfig>,
    pub detectors: Vec<SiliconDetectorConfig>,
    pub decay: Option<DecayConfig>,
    /// Value axis of the per-board summaries.
    pub summary_binning: Binning,
    pub histograms: Vec<HistogramArgs>,
    pub input: ReactionSettings,
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot open config file {0}: {1}")]
    Io(String, std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// The SE-RESO setup: five ADCs, four TDCs, one MTDC and one MQDC, with two
/// annular silicon detectors on ADC geo 14 (S1) and 13 (S2).
impl Default for AnalysisConfig {
    fn default() -> Self {
        let raw = Binning::new(512, 0.0, 4096.0);
        let strips = Binning::new(16, 0.0, 16.0);
        let trigger_bits = [
            ("trig_bit_master", "mtdc_16"),
            ("trig_bit_ic_ds", "mtdc_17"),
            ("trig_bit_neut", "mtdc_18"),
            ("trig_bit_s2", "mtdc_19"),
            ("trig_bit_s1", "mtdc_20"),
            ("trig_bit_rf", "mtdc_21"),
        ];

        let mut histograms = vec![
            HistogramArgs::new_2d("ic_ede_raw", "adc_0_0", raw, "adc_0_1", raw),
            HistogramArgs::new_2d("si_ede_raw", "s1_back_emax", raw, "s2_back_emax", raw),
            HistogramArgs::new_2d("s2_kin_raw", "s2_front_chmax", strips, "s2_back_emax", raw),
            HistogramArgs::new_2d("s1_kin_raw", "s1_front_chmax", strips, "s1_back_emax", raw),
            HistogramArgs::new_2d(
                "s1_angles",
                "s1_phi",
                Binning::new(180, -3.2, 3.2),
                "s1_theta",
                Binning::new(180, 0.0, 1.6),
            ),
            HistogramArgs::new_2d(
                "s2_angles",
                "s2_phi",
                Binning::new(180, -3.2, 3.2),
                "s2_theta",
                Binning::new(180, 0.0, 1.6),
            ),
            HistogramArgs::new_1d("qval_est", "qval", Binning::new(1000, -20.0, 20.0)),
        ];
        histograms.extend(
            trigger_bits
                .into_iter()
                .map(|(name, parameter)| HistogramArgs::new_1d(name, parameter, raw)),
        );

        Self {
            banks: vec![
                BoardBank::new(BoardKind::Adc, vec![4, 11, 12, 13, 14]),
                BoardBank::new(BoardKind::Tdc, vec![6, 7, 8, 9]),
                BoardBank::new(BoardKind::Mtdc, vec![18]),
                BoardBank::new(BoardKind::Mqdc, vec![20]),
            ],
            timing: Some(TimingConfig {
                board: 18,
                ticks_to_ns: DEFAULT_TICKS_TO_NS,
            }),
            detectors: vec![
                SiliconDetectorConfig {
                    name: "s1".to_owned(),
                    board: 14,
                    geometry: DetectorGeometry::new(24.0, 48.0, 124.4),
                    calibration: EnergyCalibration::default(),
                },
                SiliconDetectorConfig {
                    name: "s2".to_owned(),
                    board: 13,
                    geometry: DetectorGeometry::new(11.53, 35.0, 68.9),
                    calibration: EnergyCalibration::default(),
                },
            ],
            decay: None,
            summary_binning: Binning::new(1024, 0.0, 4096.0),
            histograms,
            input: ReactionSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_default() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{
                "banks": [{"kind": "adc", "boards": [4, 11]}],
                "timing": null,
                "detectors": [],
                "decay": {
                    "detector": "s1",
                    "masses": {"light": 3727.379, "heavy": 14895.08, "ejected": 11174.862}
                },
                "histograms": [],
                "input": {"frag-tke": 4.5}
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.banks,
            vec![BoardBank::new(BoardKind::Adc, vec![4, 11])]
        );
        assert_eq!(config.timing, None);
        assert_eq!(config.decay.unwrap().masses.heavy, 14895.08);
        assert_eq!(config.input.frag_tke, 4.5);
        assert_eq!(config.input.beam_tke, 0.0);
        assert_eq!(config.summary_binning, Binning::new(1024, 0.0, 4096.0));
    }

    #[test]
    fn detector_calibration_defaults_to_identity() {
        let detector: SiliconDetectorConfig = serde_json::from_str(
            r#"{
                "name": "s3",
                "board": 12,
                "geometry": {"inner-radius": 5.0, "outer-radius": 20.0, "standoff": 50.0}
            }"#,
        )
        .unwrap();
        assert_eq!(detector.calibration, EnergyCalibration::default());
    }
}
