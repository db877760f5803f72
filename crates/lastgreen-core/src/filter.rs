//! # Filter Engine
//!
//! Accept/reject decision for one located candidate against caller-supplied
//! upstream-dependency and material constraints.
//!
//! - An empty filter admits everything.
//! - Every dependency pair and every material pair must match.
//! - This is a single-candidate decision: a rejected candidate is not
//!   replaced by an older one.

use crate::{LastGreenError, StageRun};
use std::collections::BTreeMap;
use std::fmt;

/// Constraints a candidate must satisfy to be remembered as the green build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GreenFilter {
    /// upstream pipeline name -> required upstream instance identifier
    pub dependencies: BTreeMap<String, String>,
    /// material name (`<repo>-git`) -> required revision
    pub materials: BTreeMap<String, String>,
}

/// Why a candidate was turned away. The first failing pair is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Dependency { pipeline: String, instance: String },
    Material { name: String, revision: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dependency { pipeline, instance } => {
                write!(f, "no dependency on {} at {}", pipeline, instance)
            }
            Self::Material { name, revision } => {
                write!(f, "no material {} at revision {}", name, revision)
            }
        }
    }
}

impl GreenFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dependency(
        mut self,
        pipeline: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        self.dependencies.insert(pipeline.into(), instance.into());
        self
    }

    #[must_use]
    pub fn with_material(mut self, name: impl Into<String>, revision: impl Into<String>) -> Self {
        self.materials.insert(name.into(), revision.into());
        self
    }

    /// Add a dependency constraint written as `PIPELINE=INSTANCE`.
    pub fn parse_dependency(&mut self, arg: &str) -> Result<(), LastGreenError> {
        let (pipeline, instance) = split_pair(arg)?;
        self.dependencies.insert(pipeline, instance);
        Ok(())
    }

    /// Add a material constraint written as `NAME=REVISION`.
    pub fn parse_material(&mut self, arg: &str) -> Result<(), LastGreenError> {
        let (name, revision) = split_pair(arg)?;
        self.materials.insert(name, revision);
        Ok(())
    }

    /// Check every constraint, reporting the first one that fails.
    pub fn evaluate(&self, candidate: &StageRun) -> Result<(), Rejection> {
        for (pipeline, instance) in &self.dependencies {
            let satisfied = candidate
                .dependencies()
                .iter()
                .any(|dep| &dep.pipeline_name == pipeline && &dep.identifier == instance);
            if !satisfied {
                return Err(Rejection::Dependency {
                    pipeline: pipeline.clone(),
                    instance: instance.clone(),
                });
            }
        }

        for (name, revision) in &self.materials {
            // Every material sharing the name must be at the revision.
            let mut named = candidate
                .materials()
                .iter()
                .filter(|material| &material.name() == name)
                .peekable();
            let satisfied =
                named.peek().is_some() && named.all(|material| &material.revision == revision);
            if !satisfied {
                return Err(Rejection::Material {
                    name: name.clone(),
                    revision: revision.clone(),
                });
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn admits(&self, candidate: &StageRun) -> bool {
        self.evaluate(candidate).is_ok()
    }
}

/// Split `NAME=VALUE` at the first `=`.
fn split_pair(arg: &str) -> Result<(String, String), LastGreenError> {
    let (name, value) = arg.split_once('=').ok_or_else(|| {
        LastGreenError::InvalidFilter(format!("expected NAME=VALUE, got '{}'", arg))
    })?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return Err(LastGreenError::InvalidFilter(format!(
            "empty name or value in '{}'",
            arg
        )));
    }
    Ok((name.to_string(), value.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
