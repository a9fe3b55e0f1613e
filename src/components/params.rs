//! Parameternodes: de punten waar de host-scene de graph binnenkomt.

use std::collections::BTreeMap;

use crate::geom::{CurveGeometry, Point3};
use crate::graph::node::{MetaMap, MetaValue};
use crate::graph::value::Value;

use super::{Component, ComponentError, ComponentResult};

pub const PIN_INPUT_POINTS: &str = "Points";
pub const PIN_INPUT_TRANSFORM: &str = "Transform";
pub const PIN_INPUT_NO_STRETCH: &str = "NoStretch";
pub const PIN_INPUT_SLIDE_AMOUNT: &str = "SlideAmount";

pub const PIN_OUTPUT: &str = "Output";
pub const PIN_OUTPUT_CURVE: &str = "Curve";
pub const PIN_OUTPUT_TRANSFORM: &str = "Transform";
pub const PIN_OUTPUT_NO_STRETCH: &str = "NoStretch";
pub const PIN_OUTPUT_SLIDE_AMOUNT: &str = "SlideAmount";

/// Beschikbare componenten binnen deze module.
#[derive(Debug, Clone, Copy)]
pub enum ComponentKind {
    /// Constante numerieke waarde uit meta.
    Number,
    /// Host-curve: controlepunten in, curvegeometrie uit.
    Curve,
    /// Door de gebruiker bestuurbare transform, met op de eerste control de
    /// stretch- en slide-pinnen.
    Control,
}

/// Volledige lijst met componentregistraties voor de parameternodes.
pub const REGISTRATIONS: &[super::Registration] = &[
    super::Registration {
        names: &["Number"],
        kind: super::ComponentKind::Params(ComponentKind::Number),
    },
    super::Registration {
        names: &["Curve"],
        kind: super::ComponentKind::Params(ComponentKind::Curve),
    },
    super::Registration {
        names: &["Control"],
        kind: super::ComponentKind::Params(ComponentKind::Control),
    },
];

impl ComponentKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::Curve => "Curve",
            Self::Control => "Control",
        }
    }
}

impl Component for ComponentKind {
    fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult {
        match self {
            Self::Number => evaluate_number(meta),
            Self::Curve => evaluate_curve(inputs, meta),
            Self::Control => evaluate_control(inputs),
        }
    }
}

fn evaluate_number(meta: &MetaMap) -> ComponentResult {
    let value = meta
        .get("Value")
        .and_then(MetaValue::as_number)
        .unwrap_or(0.0);
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT.to_owned(), Value::Number(value));
    Ok(outputs)
}

fn evaluate_curve(inputs: &[Value], meta: &MetaMap) -> ComponentResult {
    let points_value = inputs
        .first()
        .ok_or_else(|| ComponentError::new("curvenode mist controlepunten"))?;

    let points: Vec<Point3> = points_value
        .expect_list()?
        .iter()
        .map(|value| value.expect_point().map(Point3::from_array))
        .collect::<Result<_, _>>()?;

    let degree = meta
        .get("Degree")
        .and_then(MetaValue::as_integer)
        .unwrap_or(3)
        .max(1) as usize;

    let geometry = CurveGeometry::from_points(&points, degree)?;
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_CURVE.to_owned(), Value::Curve(geometry));
    Ok(outputs)
}

fn evaluate_control(inputs: &[Value]) -> ComponentResult {
    let transform = inputs
        .first()
        .ok_or_else(|| ComponentError::new("controlnode mist transform"))?
        .expect_transform()?;

    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT_TRANSFORM.to_owned(), Value::Transform(transform));

    // De eerste control draagt daarnaast de stretch- en slide-waarden.
    if inputs.len() >= 3 {
        let no_stretch = inputs[1].expect_number()?.clamp(0.0, 1.0);
        let slide = inputs[2].expect_number()?;
        outputs.insert(PIN_OUTPUT_NO_STRETCH.to_owned(), Value::Number(no_stretch));
        outputs.insert(PIN_OUTPUT_SLIDE_AMOUNT.to_owned(), Value::Number(slide));
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Transform;

    #[test]
    fn number_echoes_meta_value() {
        let mut meta = MetaMap::new();
        meta.insert("Value".to_owned(), MetaValue::Number(0.75));
        let outputs = ComponentKind::Number.evaluate(&[], &meta).unwrap();
        assert_eq!(outputs[PIN_OUTPUT], Value::Number(0.75));
    }

    #[test]
    fn curve_builds_geometry_from_points() {
        let points = Value::List(vec![
            Value::Point([0.0, 0.0, 0.0]),
            Value::Point([0.0, 0.0, 1.0]),
        ]);
        let outputs = ComponentKind::Curve
            .evaluate(&[points], &MetaMap::new())
            .unwrap();
        let curve = outputs[PIN_OUTPUT_CURVE].expect_curve().unwrap();
        assert!((curve.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn curve_rejects_non_point_entries() {
        let points = Value::List(vec![Value::Point([0.0; 3]), Value::Number(1.0)]);
        assert!(ComponentKind::Curve
            .evaluate(&[points], &MetaMap::new())
            .is_err());
    }

    #[test]
    fn control_echoes_transform_and_master_pins() {
        let inputs = [
            Value::Transform(Transform::identity()),
            Value::Number(1.4),
            Value::Number(-0.2),
        ];
        let outputs = ComponentKind::Control
            .evaluate(&inputs, &MetaMap::new())
            .unwrap();
        assert_eq!(outputs[PIN_OUTPUT_NO_STRETCH], Value::Number(1.0));
        assert_eq!(outputs[PIN_OUTPUT_SLIDE_AMOUNT], Value::Number(-0.2));
        assert!(outputs.contains_key(PIN_OUTPUT_TRANSFORM));
    }

    #[test]
    fn plain_control_exposes_transform_only() {
        let inputs = [Value::Transform(Transform::identity())];
        let outputs = ComponentKind::Control
            .evaluate(&inputs, &MetaMap::new())
            .unwrap();
        assert_eq!(outputs.len(), 1);
    }
}
