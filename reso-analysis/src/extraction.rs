//! Per-side maximum finding for segmented silicon detectors, and the
//! conversion of timing channels from digitiser ticks to nanoseconds.
use crate::{
    channel_map::MappedBoard,
    error::AnalysisError,
    parameters::{ParameterId, ParameterStore},
};
use specter_common::Channel;
use std::ops::Range;
use strum::{Display, EnumIter};

/// Number of strips on each side of a silicon detector.
pub const STRIPS_PER_SIDE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DetectorSide {
    Front,
    Back,
}

impl DetectorSide {
    /// Board channels wired to this side.
    pub fn channels(self) -> Range<Channel> {
        match self {
            DetectorSide::Front => 0..STRIPS_PER_SIDE as Channel,
            DetectorSide::Back => STRIPS_PER_SIDE as Channel..2 * STRIPS_PER_SIDE as Channel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideMaximum {
    /// Strip index within the side.
    pub channel: usize,
    pub energy: f64,
}

/// Running maximum over one side, unset until the first reading.
#[derive(Debug, Default, Clone, Copy)]
struct RunningMaximum(Option<SideMaximum>);

impl RunningMaximum {
    fn observe(&mut self, channel: usize, energy: f64) {
        if energy.is_nan() {
            return;
        }
        match self.0 {
            Some(current) if !(current.energy < energy) => {}
            _ => self.0 = Some(SideMaximum { channel, energy }),
        }
    }
}

/// Returns the lowest index holding the largest reading, ignoring unset readings.
pub fn find_maximum<I>(readings: I) -> Option<SideMaximum>
where
    I: IntoIterator<Item = Option<f64>>,
{
    readings
        .into_iter()
        .enumerate()
        .fold(RunningMaximum::default(), |mut max, (channel, reading)| {
            if let Some(energy) = reading {
                max.observe(channel, energy);
            }
            max
        })
        .0
}

/// Inputs and outputs of one side of one detector.
#[derive(Debug)]
pub struct SideChannels {
    side: DetectorSide,
    inputs: Vec<ParameterId>,
    emax: ParameterId,
    chmax: ParameterId,
}

impl SideChannels {
    /// Creates `<detector>_<side>_emax` and `<detector>_<side>_chmax`.
    pub fn create(
        detector: &str,
        side: DetectorSide,
        board: &MappedBoard,
        store: &mut ParameterStore,
    ) -> Result<Self, AnalysisError> {
        let inputs = side
            .channels()
            .map(|channel| {
                board
                    .parameter(channel)
                    .ok_or(AnalysisError::UnknownBoard(board.geo()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            side,
            inputs,
            emax: store.create(format!("{detector}_{side}_emax"))?,
            chmax: store.create(format!("{detector}_{side}_chmax"))?,
        })
    }

    pub fn side(&self) -> DetectorSide {
        self.side
    }

    pub fn emax(&self) -> ParameterId {
        self.emax
    }

    pub fn chmax(&self) -> ParameterId {
        self.chmax
    }

    /// Finds this event's maximum and writes it to the output parameters.
    pub fn extract(&self, store: &mut ParameterStore) -> Option<SideMaximum> {
        let maximum = find_maximum(self.inputs.iter().map(|&id| store.value(id)));
        if let Some(maximum) = maximum {
            store.set(self.emax, maximum.energy);
            store.set(self.chmax, maximum.channel as f64);
        }
        maximum
    }
}

/// Scales every valid channel of a timing board from ticks to nanoseconds.
#[derive(Debug)]
pub struct TimeConversion {
    channels: Vec<ParameterId>,
    ticks_to_ns: f64,
}

impl TimeConversion {
    pub fn new(board: &MappedBoard, ticks_to_ns: f64) -> Result<Self, AnalysisError> {
        if !ticks_to_ns.is_finite() || ticks_to_ns <= 0.0 {
            return Err(AnalysisError::InvalidTimeConversion(ticks_to_ns));
        }
        Ok(Self {
            channels: board.parameters().to_vec(),
            ticks_to_ns,
        })
    }

    /// Must run once per event, after routing. Returns the number of converted channels.
    pub fn apply(&self, store: &mut ParameterStore) -> usize {
        let mut converted = 0;
        for &id in &self.channels {
            if let Some(ticks) = store.value(id) {
                store.set(id, ticks * self.ticks_to_ns);
                converted += 1;
            }
        }
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_map::{BoardBank, BoardKind, ChannelMap};
    use rand::Rng;

    #[test]
    fn maximum_of_empty_side_is_none() {
        assert_eq!(find_maximum([None; STRIPS_PER_SIDE]), None);
    }

    #[test]
    fn first_index_wins_ties() {
        let mut readings = [Some(10.0); STRIPS_PER_SIDE];
        readings[3] = Some(50.0);
        readings[9] = Some(50.0);
        readings[12] = None;
        assert_eq!(
            find_maximum(readings),
            Some(SideMaximum {
                channel: 3,
                energy: 50.0
            })
        );
    }

    #[test]
    fn negative_readings_are_still_maxima() {
        let mut readings = [None; STRIPS_PER_SIDE];
        readings[7] = Some(-4.0);
        readings[8] = Some(-2.0);
        assert_eq!(
            find_maximum(readings),
            Some(SideMaximum {
                channel: 8,
                energy: -2.0
            })
        );
    }

    #[test]
    fn nan_readings_are_ignored() {
        let readings = [Some(f64::NAN), Some(1.0), Some(f64::NAN)];
        assert_eq!(
            find_maximum(readings),
            Some(SideMaximum {
                channel: 1,
                energy: 1.0
            })
        );
    }

    #[test]
    fn random_sides_pick_lowest_index_of_maximum() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let readings: Vec<Option<f64>> = (0..STRIPS_PER_SIDE)
                .map(|_| rng.random_bool(0.8).then(|| rng.random_range(0..8) as f64))
                .collect();
            let expected = readings
                .iter()
                .flatten()
                .copied()
                .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))));
            let result = find_maximum(readings.iter().copied());
            match expected {
                None => assert_eq!(result, None),
                Some(max) => {
                    let result = result.unwrap();
                    assert_eq!(result.energy, max);
                    let first = readings.iter().position(|r| *r == Some(max)).unwrap();
                    assert_eq!(result.channel, first);
                }
            }
        }
    }

    fn silicon_board() -> (ChannelMap, ParameterStore) {
        let mut store = ParameterStore::default();
        let map = ChannelMap::build(&[BoardBank::new(BoardKind::Adc, vec![14])], &mut store)
            .unwrap();
        (map, store)
    }

    #[test]
    fn sides_write_outputs_with_side_local_channel() {
        let (map, mut store) = silicon_board();
        let board = map.board(14).unwrap();
        let front = SideChannels::create("s1", DetectorSide::Front, board, &mut store).unwrap();
        let back = SideChannels::create("s1", DetectorSide::Back, board, &mut store).unwrap();

        store.set(board.parameter(2).unwrap(), 300.0);
        store.set(board.parameter(5).unwrap(), 800.0);
        store.set(board.parameter(20).unwrap(), 900.0);

        assert_eq!(
            front.extract(&mut store),
            Some(SideMaximum {
                channel: 5,
                energy: 800.0
            })
        );
        assert_eq!(
            back.extract(&mut store),
            Some(SideMaximum {
                channel: 4,
                energy: 900.0
            })
        );
        assert_eq!(store.value(front.emax()), Some(800.0));
        assert_eq!(store.value(front.chmax()), Some(5.0));
        assert_eq!(store.value(back.emax()), Some(900.0));
        assert_eq!(store.value(back.chmax()), Some(4.0));
        assert_eq!(
            store.get(back.chmax()).unwrap().name(),
            "s1_back_chmax"
        );
    }

    #[test]
    fn side_without_readings_leaves_outputs_invalid() {
        let (map, mut store) = silicon_board();
        let board = map.board(14).unwrap();
        let back = SideChannels::create("s2", DetectorSide::Back, board, &mut store).unwrap();
        store.set(board.parameter(3).unwrap(), 100.0);

        assert_eq!(back.extract(&mut store), None);
        assert_eq!(store.value(back.emax()), None);
        assert_eq!(store.value(back.chmax()), None);
    }

    #[test]
    fn time_conversion_scales_valid_channels_only() {
        let mut store = ParameterStore::default();
        let map = ChannelMap::build(&[BoardBank::new(BoardKind::Mtdc, vec![18])], &mut store)
            .unwrap();
        let board = map.board(18).unwrap();
        let conversion = TimeConversion::new(board, 0.0625).unwrap();

        store.set(board.parameter(16).unwrap(), 1600.0);
        assert_eq!(conversion.apply(&mut store), 1);
        assert_eq!(store.value(board.parameter(16).unwrap()), Some(100.0));
        assert_eq!(store.value(board.parameter(17).unwrap()), None);
    }

    #[test]
    fn invalid_time_conversion_is_rejected() {
        let mut store = ParameterStore::default();
        let map = ChannelMap::build(&[BoardBank::new(BoardKind::Mtdc, vec![18])], &mut store)
            .unwrap();
        assert!(TimeConversion::new(map.board(18).unwrap(), 0.0).is_err());
        assert!(TimeConversion::new(map.board(18).unwrap(), f64::NAN).is_err());
    }
}
