//! Curvemeting: lengte, afstandsgebaseerde sampling en herbouw.

use std::collections::BTreeMap;

use crate::graph::node::{MetaMap, MetaValue};
use crate::graph::value::Value;

use super::{Component, ComponentError, ComponentResult};

pub const PIN_INPUT_CURVE: &str = "Curve";
pub const PIN_INPUT_FRACTION: &str = "Fraction";

pub const PIN_OUTPUT_LENGTH: &str = "Length";
pub const PIN_OUTPUT_POSITION: &str = "Position";
pub const PIN_OUTPUT_TANGENT: &str = "Tangent";
pub const PIN_OUTPUT_CURVE: &str = "Curve";

/// Beschikbare componenten binnen deze module.
#[derive(Debug, Clone, Copy)]
pub enum ComponentKind {
    /// Live booglengte van de inkomende curve.
    ArcLength,
    /// Punt en tangent op een fractie van de booglengte, zodat sampling
    /// uniform in afstand blijft waar de parametrisatie dat niet is.
    PointAtFraction,
    /// Herbouwt de curve naar een vast aantal spans en een vaste graad.
    RebuildCurve,
}

/// Volledige lijst met componentregistraties voor de curvemeting.
pub const REGISTRATIONS: &[super::Registration] = &[
    super::Registration {
        names: &["Arc Length"],
        kind: super::ComponentKind::CurveMeasure(ComponentKind::ArcLength),
    },
    super::Registration {
        names: &["Point At Fraction"],
        kind: super::ComponentKind::CurveMeasure(ComponentKind::PointAtFraction),
    },
    super::Registration {
        names: &["Rebuild Curve"],
        kind: super::ComponentKind::CurveMeasure(ComponentKind::RebuildCurve),
    },
];

impl ComponentKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ArcLength => "Arc Length",
            Self::PointAtFraction => "Point At Fraction",
            Self::RebuildCurve => "Rebuild Curve",
        }
    }
}

impl Component for ComponentKind {
    fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult {
        match self {
            Self::ArcLength => evaluate_arc_length(inputs),
            Self::PointAtFraction => evaluate_point_at_fraction(inputs),
            Self::RebuildCurve => evaluate_rebuild(inputs, meta),
        }
    }
}

fn curve_input<'a>(inputs: &'a [Value]) -> Result<&'a crate::geom::CurveGeometry, ComponentError> {
    inputs
        .first()
        .ok_or_else(|| ComponentError::new("curve-input ontbreekt"))?
        .expect_curve()
        .map_err(ComponentError::from)
}

fn evaluate_arc_length(inputs: &[Value]) -> ComponentResult {
    let curve = curve_input(inputs)?;
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_LENGTH.to_owned(), Value::Number(curve.length()));
    Ok(outputs)
}

fn evaluate_point_at_fraction(inputs: &[Value]) -> ComponentResult {
    let curve = curve_input(inputs)?;
    let fraction = inputs
        .get(1)
        .ok_or_else(|| ComponentError::new("fractie-input ontbreekt"))?
        .expect_number()?;

    let sample = curve.sample_at_fraction(fraction);
    let mut outputs = BTreeMap::new();
    outputs.insert(
        PIN_OUTPUT_POSITION.to_owned(),
        Value::Point(sample.point.to_array()),
    );
    outputs.insert(
        PIN_OUTPUT_TANGENT.to_owned(),
        Value::Vector(sample.tangent.to_array()),
    );
    Ok(outputs)
}

fn evaluate_rebuild(inputs: &[Value], meta: &MetaMap) -> ComponentResult {
    let curve = curve_input(inputs)?;
    let spans = meta
        .get("Spans")
        .and_then(MetaValue::as_integer)
        .unwrap_or(1)
        .max(1) as usize;
    let degree = meta
        .get("Degree")
        .and_then(MetaValue::as_integer)
        .unwrap_or(3)
        .max(1) as usize;

    let rebuilt = curve.rebuilt(spans, degree)?;
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_CURVE.to_owned(), Value::Curve(rebuilt));
    Ok(outputs)
}
