use crate::{
    parameters::{Parameter, ParameterId, ParameterStore, Variable},
    publication::{Binning, HistogramArgs, PublicationError, SpectrumManager, SummaryArgs},
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundAxis {
    pub parameter: ParameterId,
    pub binning: Binning,
}

impl BoundAxis {
    fn bin(&self, parameters: &ParameterStore) -> Option<usize> {
        parameters
            .value(self.parameter)
            .and_then(|value| self.binning.bin(value))
    }
}

#[derive(Debug)]
pub enum HistogramData {
    OneD {
        x: BoundAxis,
        counts: Array1<u64>,
    },
    TwoD {
        x: BoundAxis,
        y: BoundAxis,
        counts: Array2<u64>,
    },
    /// Rows follow the order of `parameters`.
    Summary {
        parameters: Vec<ParameterId>,
        binning: Binning,
        counts: Array2<u64>,
    },
}

#[derive(Debug)]
pub struct Histogram {
    name: String,
    data: HistogramData,
    entries: u64,
}

impl Histogram {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &HistogramData {
        &self.data
    }

    /// Number of values counted, over all rows for a summary.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    fn fill(&mut self, parameters: &ParameterStore) {
        match &mut self.data {
            HistogramData::OneD { x, counts } => {
                if let Some(count) = x.bin(parameters).and_then(|i| counts.get_mut(i)) {
                    *count += 1;
                    self.entries += 1;
                }
            }
            HistogramData::TwoD { x, y, counts } => {
                if let Some(count) = Option::zip(x.bin(parameters), y.bin(parameters))
                    .and_then(|(i, j)| counts.get_mut((i, j)))
                {
                    *count += 1;
                    self.entries += 1;
                }
            }
            HistogramData::Summary {
                parameters: rows,
                binning,
                counts,
            } => {
                for (row, &id) in rows.iter().enumerate() {
                    if let Some(count) = parameters
                        .value(id)
                        .and_then(|value| binning.bin(value))
                        .and_then(|bin| counts.get_mut((row, bin)))
                    {
                        *count += 1;
                        self.entries += 1;
                    }
                }
            }
        }
    }
}

/// In-memory spectrum manager with fixed-bin histograms.
#[derive(Debug, Default)]
pub struct HistogramManager {
    parameters: HashMap<String, ParameterId>,
    variables: Vec<Variable>,
    histograms: Vec<Histogram>,
    events: u64,
}

impl HistogramManager {
    pub fn histogram(&self, name: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|histogram| histogram.name == name)
    }

    pub fn histograms(&self) -> &[Histogram] {
        &self.histograms
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn num_bound_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    /// Logs the number of entries of every histogram.
    pub fn report(&self) {
        info!(
            "{} events, {} histograms, {} bound parameters",
            self.events,
            self.histograms.len(),
            self.parameters.len()
        );
        for variable in &self.variables {
            info!("Variable {} = {}", variable.name(), variable.value());
        }
        for histogram in &self.histograms {
            info!("Histogram {}: {} entries", histogram.name, histogram.entries);
        }
    }

    fn check_name(&self, name: &str) -> Result<(), PublicationError> {
        if self.histogram(name).is_some() {
            Err(PublicationError::DuplicateHistogram(name.to_owned()))
        } else {
            Ok(())
        }
    }

    fn lookup(&self, histogram: &str, parameter: &str) -> Result<ParameterId, PublicationError> {
        self.parameters
            .get(parameter)
            .copied()
            .ok_or_else(|| PublicationError::UnboundParameter {
                histogram: histogram.to_owned(),
                parameter: parameter.to_owned(),
            })
    }

    fn bind_axis(
        &self,
        histogram: &str,
        parameter: &str,
        binning: Binning,
    ) -> Result<BoundAxis, PublicationError> {
        binning.validate(histogram)?;
        Ok(BoundAxis {
            parameter: self.lookup(histogram, parameter)?,
            binning,
        })
    }
}

impl SpectrumManager for HistogramManager {
    fn bind_parameter(&mut self, id: ParameterId, parameter: &Parameter) {
        self.parameters.insert(parameter.name().to_owned(), id);
    }

    fn bind_variable(&mut self, variable: &Variable) {
        self.variables.push(variable.clone());
    }

    fn add_histogram(&mut self, args: HistogramArgs) -> Result<(), PublicationError> {
        self.check_name(&args.name)?;
        let x = self.bind_axis(&args.name, &args.x.parameter, args.x.binning)?;
        let data = match &args.y {
            None => HistogramData::OneD {
                x,
                counts: Array1::zeros(x.binning.bins),
            },
            Some(y) => {
                let y = self.bind_axis(&args.name, &y.parameter, y.binning)?;
                HistogramData::TwoD {
                    x,
                    y,
                    counts: Array2::zeros((x.binning.bins, y.binning.bins)),
                }
            }
        };
        debug!("Added histogram {}", args.name);
        self.histograms.push(Histogram {
            name: args.name,
            data,
            entries: 0,
        });
        Ok(())
    }

    fn add_histogram_summary(
        &mut self,
        args: SummaryArgs,
        parameters: &[String],
    ) -> Result<(), PublicationError> {
        self.check_name(&args.name)?;
        if parameters.is_empty() {
            return Err(PublicationError::EmptySummary(args.name));
        }
        args.binning.validate(&args.name)?;
        let rows = parameters
            .iter()
            .map(|parameter| self.lookup(&args.name, parameter))
            .collect::<Result<Vec<_>, _>>()?;
        let counts = Array2::zeros((rows.len(), args.binning.bins));
        debug!("Added summary {} over {} parameters", args.name, rows.len());
        self.histograms.push(Histogram {
            name: args.name,
            data: HistogramData::Summary {
                parameters: rows,
                binning: args.binning,
                counts,
            },
            entries: 0,
        });
        Ok(())
    }

    fn update(&mut self, parameters: &ParameterStore) {
        self.events += 1;
        for histogram in &mut self.histograms {
            histogram.fill(parameters);
        }
    }
}
