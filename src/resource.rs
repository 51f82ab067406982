use std::collections::HashMap;
use thiserror::Error;

/// Why the engine could not read its impulse resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("no resource bound")]
    Unbound,
    #[error("resource '{0}' not found")]
    NotFound(String),
    #[error("invalid resource format: '{0}' is not a sample buffer")]
    InvalidFormat(String),
}

/// Host-side lookup of named floating-point buffers.
///
/// The engine only ever reads through this trait. Whatever the owner does to a
/// buffer in between becomes visible at the next re-analysis check.
pub trait ImpulseSource {
    fn length(&self, name: &str) -> Result<usize, ResourceError>;
    fn samples(&self, name: &str) -> Result<&[f32], ResourceError>;
}

/// An entry in a [`BufferTable`].
#[derive(Debug, Clone)]
pub enum Resource {
    /// A floating-point sample buffer usable as an impulse response.
    Samples(Vec<f32>),
    /// Some other host object registered under the name, identified by kind.
    Foreign(String),
}

/// In-memory named buffer registry, the host's symbol table for impulses.
#[derive(Debug, Default, Clone)]
pub struct BufferTable {
    entries: HashMap<String, Resource>,
}

impl BufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a sample buffer under `name`.
    pub fn insert_samples(&mut self, name: impl Into<String>, samples: Vec<f32>) {
        self.entries.insert(name.into(), Resource::Samples(samples));
    }

    /// Register a non-sample object under `name`.
    pub fn insert_foreign(&mut self, name: impl Into<String>, kind: impl Into<String>) {
        self.entries
            .insert(name.into(), Resource::Foreign(kind.into()));
    }

    pub fn remove(&mut self, name: &str) -> Option<Resource> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Mutable access to a sample buffer, e.g. to rewrite its contents in place.
    pub fn samples_mut(&mut self, name: &str) -> Result<&mut Vec<f32>, ResourceError> {
        match self.entries.get_mut(name) {
            Some(Resource::Samples(samples)) => Ok(samples),
            Some(Resource::Foreign(_)) => Err(ResourceError::InvalidFormat(name.to_string())),
            None => Err(ResourceError::NotFound(name.to_string())),
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ImpulseSource for BufferTable {
    fn length(&self, name: &str) -> Result<usize, ResourceError> {
        self.samples(name).map(<[f32]>::len)
    }

    fn samples(&self, name: &str) -> Result<&[f32], ResourceError> {
        match self.entries.get(name) {
            Some(Resource::Samples(samples)) => Ok(samples.as_slice()),
            Some(Resource::Foreign(_)) => Err(ResourceError::InvalidFormat(name.to_string())),
            None => Err(ResourceError::NotFound(name.to_string())),
        }
    }
}
