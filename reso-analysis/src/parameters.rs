use crate::error::AnalysisError;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Handle to a [Parameter] owned by a [ParameterStore].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(usize);

/// A named scalar slot which is only meaningful once set in the current event.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: f64,
    valid: bool,
}

impl Parameter {
    fn new(name: String) -> Self {
        Self {
            name,
            value: 0.0,
            valid: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value, or `None` if it has not been set since the last invalidation.
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.valid = true;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// Owns every parameter of an analysis stage.
#[derive(Debug, Default)]
pub struct ParameterStore {
    parameters: Vec<Parameter>,
    by_name: HashMap<String, ParameterId>,
}

impl ParameterStore {
    pub fn create(&mut self, name: impl Into<String>) -> Result<ParameterId, AnalysisError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(AnalysisError::DuplicateParameter(name));
        }
        let id = ParameterId(self.parameters.len());
        self.by_name.insert(name.clone(), id);
        self.parameters.push(Parameter::new(name));
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<ParameterId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: ParameterId) -> Option<&Parameter> {
        self.parameters.get(id.0)
    }

    /// Shorthand for the value of a parameter which is valid in this event.
    pub fn value(&self, id: ParameterId) -> Option<f64> {
        self.get(id).and_then(Parameter::value)
    }

    pub fn set(&mut self, id: ParameterId, value: f64) {
        if let Some(parameter) = self.parameters.get_mut(id.0) {
            parameter.set_value(value);
        }
    }

    pub fn invalidate_all(&mut self) {
        self.parameters.iter_mut().for_each(Parameter::invalidate);
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterId, &Parameter)> {
        self.parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| (ParameterId(index), parameter))
    }
}

/// A named scalar written by an external input collaborator and read by the analysis.
///
/// Clones share the same value, so the writer may live on another thread.
#[derive(Debug, Clone)]
pub struct Variable {
    name: Arc<str>,
    bits: Arc<AtomicU64>,
}

impl Variable {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: Arc::from(name),
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set_value(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}
