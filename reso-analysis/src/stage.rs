use crate::{
    channel_map::ChannelMap,
    config::{AnalysisConfig, DecayConfig, TimingConfig},
    decoder::EventDecoder,
    detector::SiliconDetector,
    error::AnalysisError,
    event::Event,
    extraction::TimeConversion,
    kinematics::{self, DecayMasses, KinematicsError, LightFragment},
    parameters::{ParameterId, ParameterStore, Variable},
    publication::{SpectrumManager, SummaryArgs},
    reaction::ReactionInput,
};
use metrics::counter;
use specter_common::metrics::{
    failures::{self, FailureKind},
    names::{EVENTS_PROCESSED, FAILURES, HITS_RECEIVED, HITS_UNMAPPED},
};
use tracing::{debug, error, info, trace};

/// A unit of per-event analysis driven by the event loop.
pub trait AnalysisStage {
    fn name(&self) -> &str;

    /// Runs the full pipeline on one event. Never fails; anything which
    /// cannot be computed is left invalid.
    fn analyze_event(&mut self, event: &Event);

    fn parameters(&self) -> &ParameterStore;
}

/// Estimates the decay Q-value from the light fragment seen by one detector.
#[derive(Debug)]
struct DecayEstimator {
    energy: ParameterId,
    theta: ParameterId,
    masses: DecayMasses,
    fragment_energy: Variable,
    qval: ParameterId,
}

impl DecayEstimator {
    fn new(
        config: &DecayConfig,
        detectors: &[SiliconDetector],
        fragment_energy: &Variable,
        qval: ParameterId,
    ) -> Result<Self, AnalysisError> {
        config.masses.validate()?;
        let detector = detectors
            .iter()
            .find(|detector| detector.name() == config.detector)
            .ok_or_else(|| AnalysisError::UnknownDetector(config.detector.clone()))?;
        Ok(Self {
            energy: detector.energy(),
            theta: detector.theta(),
            masses: config.masses,
            fragment_energy: fragment_energy.clone(),
            qval,
        })
    }

    /// Returns `Ok(None)` when the detector did not give both energy and angle.
    fn estimate(&self, store: &mut ParameterStore) -> Result<Option<f64>, KinematicsError> {
        let (Some(kinetic_energy), Some(theta)) =
            (store.value(self.energy), store.value(self.theta))
        else {
            return Ok(None);
        };
        if theta.is_nan() {
            return Ok(None);
        }
        let light = LightFragment {
            mass: self.masses.light,
            kinetic_energy,
            theta,
        };
        let q = kinematics::estimate_q_value(
            &light,
            self.masses.heavy,
            self.masses.ejected,
            self.fragment_energy.value(),
        )?;
        store.set(self.qval, q);
        Ok(Some(q))
    }
}

/// The SE-RESO analysis: raw board channels, two silicon detectors and the
/// decay Q-value.
#[derive(Debug)]
pub struct ResoAnalysisStage {
    parameters: ParameterStore,
    decoder: EventDecoder,
    timing: Option<TimeConversion>,
    detectors: Vec<SiliconDetector>,
    decay: Option<DecayEstimator>,
    qval: ParameterId,
}

impl ResoAnalysisStage {
    pub const NAME: &'static str = "reso";

    #[tracing::instrument(skip_all)]
    pub fn new(
        config: &AnalysisConfig,
        manager: &mut dyn SpectrumManager,
        input: &ReactionInput,
    ) -> Result<Self, AnalysisError> {
        let mut parameters = ParameterStore::default();
        let channel_map = ChannelMap::build(&config.banks, &mut parameters)?;

        let timing = config
            .timing
            .as_ref()
            .map(|timing| Self::time_conversion(timing, &channel_map))
            .transpose()?;
        let detectors = config
            .detectors
            .iter()
            .map(|detector| SiliconDetector::create(detector, &channel_map, &mut parameters))
            .collect::<Result<Vec<_>, _>>()?;
        let qval = parameters.create("qval")?;
        let decay = config
            .decay
            .as_ref()
            .map(|decay| DecayEstimator::new(decay, &detectors, input.frag_tke(), qval))
            .transpose()?;

        for (id, parameter) in parameters.iter() {
            manager.bind_parameter(id, parameter);
        }
        manager.bind_variable(input.beam_tke());
        manager.bind_variable(input.frag_tke());

        for board in channel_map.boards() {
            let name = format!("summary_{}", board.label());
            manager.add_histogram_summary(
                SummaryArgs::new(&name, config.summary_binning),
                board.names(),
            )?;
        }
        for histogram in &config.histograms {
            manager.add_histogram(histogram.clone())?;
        }

        info!(
            "Analysis stage ready: {} parameters, {} detectors, decay estimate {}",
            parameters.len(),
            detectors.len(),
            if decay.is_some() { "on" } else { "off" }
        );
        Ok(Self {
            parameters,
            decoder: EventDecoder::new(channel_map),
            timing,
            detectors,
            decay,
            qval,
        })
    }

    fn time_conversion(
        timing: &TimingConfig,
        channel_map: &ChannelMap,
    ) -> Result<TimeConversion, AnalysisError> {
        let board = channel_map
            .board(timing.board)
            .ok_or(AnalysisError::UnknownBoard(timing.board))?;
        TimeConversion::new(board, timing.ticks_to_ns)
    }

    pub fn channel_map(&self) -> &ChannelMap {
        self.decoder.channel_map()
    }

    pub fn detectors(&self) -> &[SiliconDetector] {
        &self.detectors
    }

    pub fn qval(&self) -> ParameterId {
        self.qval
    }
}

impl AnalysisStage for ResoAnalysisStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[tracing::instrument(skip_all, level = "debug", fields(num_hits = event.len()))]
    fn analyze_event(&mut self, event: &Event) {
        self.parameters.invalidate_all();

        let routed = self.decoder.route(event, &mut self.parameters);
        counter!(HITS_RECEIVED).increment(event.len() as u64);
        if routed.unmapped > 0 {
            trace!("{} hits on unmapped channels", routed.unmapped);
            counter!(HITS_UNMAPPED).increment(routed.unmapped as u64);
        }

        if let Some(timing) = &self.timing {
            let converted = timing.apply(&mut self.parameters);
            trace!("Converted {converted} timing channels");
        }

        for detector in &self.detectors {
            detector.analyze(&mut self.parameters);
        }

        if let Some(decay) = &self.decay {
            match decay.estimate(&mut self.parameters) {
                Ok(Some(q)) => debug!("Q-value estimate: {q}"),
                Ok(None) => {}
                Err(e) => {
                    error!("Q-value estimate failed: {e}");
                    counter!(
                        FAILURES,
                        &[failures::get_label(FailureKind::InvalidKinematics)]
                    )
                    .increment(1);
                }
            }
        }

        counter!(EVENTS_PROCESSED).increment(1);
    }

    fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }
}
