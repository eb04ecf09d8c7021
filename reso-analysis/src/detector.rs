use crate::{
    channel_map::ChannelMap,
    error::AnalysisError,
    extraction::{DetectorSide, SideChannels},
    geometry::{self, DetectorGeometry},
    parameters::{ParameterId, ParameterStore},
};
use serde::Deserialize;
use specter_common::BoardId;

/// Linear conversion from ADC channel to energy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnergyCalibration {
    pub gain: f64,
    pub offset: f64,
}

impl Default for EnergyCalibration {
    fn default() -> Self {
        Self {
            gain: 1.0,
            offset: 0.0,
        }
    }
}

impl EnergyCalibration {
    pub fn apply(&self, raw: f64) -> f64 {
        self.gain * raw + self.offset
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiliconDetectorConfig {
    pub name: String,
    /// Geometry id of the ADC carrying both sides of the detector.
    pub board: BoardId,
    pub geometry: DetectorGeometry,
    #[serde(default)]
    pub calibration: EnergyCalibration,
}

/// A double-sided segmented silicon detector read out by one ADC.
#[derive(Debug)]
pub struct SiliconDetector {
    name: String,
    front: SideChannels,
    back: SideChannels,
    geometry: DetectorGeometry,
    calibration: EnergyCalibration,
    energy: ParameterId,
    theta: ParameterId,
    phi: ParameterId,
}

impl SiliconDetector {
    pub fn create(
        config: &SiliconDetectorConfig,
        channel_map: &ChannelMap,
        store: &mut ParameterStore,
    ) -> Result<Self, AnalysisError> {
        config.geometry.validate(&config.name)?;
        if !(config.calibration.gain.is_finite() && config.calibration.offset.is_finite()) {
            return Err(AnalysisError::InvalidCalibration(config.name.clone()));
        }
        let board = channel_map
            .board(config.board)
            .ok_or(AnalysisError::UnknownBoard(config.board))?;
        let name = &config.name;
        Ok(Self {
            front: SideChannels::create(name, DetectorSide::Front, board, store)?,
            back: SideChannels::create(name, DetectorSide::Back, board, store)?,
            geometry: config.geometry,
            calibration: config.calibration,
            energy: store.create(format!("{name}_energy"))?,
            theta: store.create(format!("{name}_theta"))?,
            phi: store.create(format!("{name}_phi"))?,
            name: name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn energy(&self) -> ParameterId {
        self.energy
    }

    pub fn theta(&self) -> ParameterId {
        self.theta
    }

    pub fn phi(&self) -> ParameterId {
        self.phi
    }

    pub fn side(&self, side: DetectorSide) -> &SideChannels {
        match side {
            DetectorSide::Front => &self.front,
            DetectorSide::Back => &self.back,
        }
    }

    /// Extracts both sides, calibrates the back energy and, when both sides
    /// fired, reconstructs the hit angles.
    #[tracing::instrument(skip_all, level = "trace", fields(detector = %self.name))]
    pub fn analyze(&self, store: &mut ParameterStore) {
        let front = self.front.extract(store);
        let back = self.back.extract(store);

        if let Some(back) = back {
            store.set(self.energy, self.calibration.apply(back.energy));
        }
        if let Some((front, back)) = Option::zip(front, back) {
            let angles =
                geometry::reconstruct(front.channel as f64, back.channel as f64, &self.geometry);
            store.set(self.theta, angles.theta);
            store.set(self.phi, angles.phi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_map::{BoardBank, BoardKind};
    use assert_approx_eq::assert_approx_eq;
    use strum::IntoEnumIterator;

    fn s1_config() -> SiliconDetectorConfig {
        SiliconDetectorConfig {
            name: "s1".to_owned(),
            board: 14,
            geometry: DetectorGeometry::new(24.0, 48.0, 124.4),
            calibration: EnergyCalibration {
                gain: 2.0,
                offset: -1.0,
            },
        }
    }

    fn setup() -> (SiliconDetector, ChannelMap, ParameterStore) {
        let mut store = ParameterStore::default();
        let map = ChannelMap::build(&[BoardBank::new(BoardKind::Adc, vec![14])], &mut store)
            .unwrap();
        let detector = SiliconDetector::create(&s1_config(), &map, &mut store).unwrap();
        (detector, map, store)
    }

    #[test]
    fn creates_named_outputs() {
        let (detector, _, store) = setup();
        let mut names = DetectorSide::iter()
            .flat_map(|side| {
                let channels = detector.side(side);
                [channels.emax(), channels.chmax()]
            })
            .chain([detector.energy(), detector.theta(), detector.phi()])
            .map(|id| store.get(id).unwrap().name().to_owned())
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(
            names,
            [
                "s1_back_chmax",
                "s1_back_emax",
                "s1_energy",
                "s1_front_chmax",
                "s1_front_emax",
                "s1_phi",
                "s1_theta"
            ]
        );
    }

    #[test]
    fn both_sides_give_angles_and_energy() {
        let (detector, map, mut store) = setup();
        store.set(map.parameter_for(14, 0).unwrap(), 500.0);
        store.set(map.parameter_for(14, 24).unwrap(), 700.0);

        detector.analyze(&mut store);

        assert_eq!(store.value(detector.energy()), Some(1399.0));
        let expected = geometry::reconstruct(0.0, 8.0, &s1_config().geometry);
        assert_approx_eq!(store.value(detector.theta()).unwrap(), expected.theta, 1e-9);
        assert_approx_eq!(store.value(detector.phi()).unwrap(), expected.phi, 1e-9);
    }

    #[test]
    fn front_only_gives_no_angles() {
        let (detector, map, mut store) = setup();
        store.set(map.parameter_for(14, 3).unwrap(), 500.0);

        detector.analyze(&mut store);

        assert_eq!(store.value(detector.energy()), None);
        assert_eq!(store.value(detector.theta()), None);
        assert_eq!(store.value(detector.phi()), None);
    }

    #[test]
    fn missing_board_is_rejected() {
        let mut store = ParameterStore::default();
        let map = ChannelMap::default();
        assert!(matches!(
            SiliconDetector::create(&s1_config(), &map, &mut store),
            Err(AnalysisError::UnknownBoard(14))
        ));
    }
}
