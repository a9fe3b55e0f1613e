//! Componentregistry en evaluatielogica.

use std::collections::HashMap;
use std::fmt;

use crate::geom::{CurveError, RibbonError};
use crate::graph::node::MetaMap;
use crate::graph::value::{Value, ValueError};

pub mod curve_measure;
pub mod params;
pub mod scalar;
pub mod surface_attach;

/// Output-map van een component: pinnaam → waarde.
pub type OutputMap = std::collections::BTreeMap<String, Value>;

/// Fouttype voor component-evaluaties.
#[derive(Debug, Clone)]
pub enum ComponentError {
    /// Een generieke fout met een bericht.
    Message(String),
}

impl ComponentError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Message(s) => s,
        }
    }
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(s) => f.write_str(s),
        }
    }
}

impl std::error::Error for ComponentError {}

impl From<ValueError> for ComponentError {
    fn from(error: ValueError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<CurveError> for ComponentError {
    fn from(error: CurveError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<RibbonError> for ComponentError {
    fn from(error: RibbonError) -> Self {
        Self::new(error.to_string())
    }
}

/// Resultaat van een component-executie.
pub type ComponentResult = Result<OutputMap, ComponentError>;

/// Trait die alle componentimplementaties dienen te implementeren.
pub trait Component {
    fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult;
}

/// Beschikbare componenttypen binnen de registry.
#[derive(Debug, Clone, Copy)]
pub enum ComponentKind {
    Params(params::ComponentKind),
    CurveMeasure(curve_measure::ComponentKind),
    Scalar(scalar::ComponentKind),
    SurfaceAttach(surface_attach::ComponentKind),
}

impl ComponentKind {
    #[must_use]
    pub fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult {
        match self {
            Self::Params(component) => component.evaluate(inputs, meta),
            Self::CurveMeasure(component) => component.evaluate(inputs, meta),
            Self::Scalar(component) => component.evaluate(inputs, meta),
            Self::SurfaceAttach(component) => component.evaluate(inputs, meta),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Params(component) => component.name(),
            Self::CurveMeasure(component) => component.name(),
            Self::Scalar(component) => component.name(),
            Self::SurfaceAttach(component) => component.name(),
        }
    }
}

/// Metadata voor registraties in de componentregistry.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub names: &'static [&'static str],
    pub kind: ComponentKind,
}

/// Registry die componentnamen naar implementaties vertaalt.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    by_name: HashMap<String, ComponentKind>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut by_name = HashMap::new();
        let tables = [
            params::REGISTRATIONS,
            curve_measure::REGISTRATIONS,
            scalar::REGISTRATIONS,
            surface_attach::REGISTRATIONS,
        ];
        for registration in tables.into_iter().flatten() {
            for name in registration.names {
                by_name.insert(normalize_name(name), registration.kind);
            }
        }
        Self { by_name }
    }
}

impl ComponentRegistry {
    /// Zoekt een component op naam (hoofdletterongevoelig).
    #[must_use]
    pub fn resolve(&self, name: Option<&str>) -> Option<ComponentKind> {
        let name = name?;
        self.by_name.get(&normalize_name(name)).copied()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_case_insensitively() {
        let registry = ComponentRegistry::default();
        assert!(registry.resolve(Some("Arc Length")).is_some());
        assert!(registry.resolve(Some("arc length")).is_some());
        assert!(registry.resolve(Some("ARC LENGTH")).is_some());
        assert!(registry.resolve(Some("onbekend component")).is_none());
        assert!(registry.resolve(None).is_none());
    }

    #[test]
    fn every_registered_kind_reports_a_name() {
        let registry = ComponentRegistry::default();
        for name in ["Number", "Curve", "Control", "Blend", "Closest Point"] {
            let kind = registry.resolve(Some(name)).expect("component bestaat");
            assert!(!kind.name().is_empty());
        }
    }
}
