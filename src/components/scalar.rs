//! Scalaire operatoren waarmee het stretch/slide-netwerk is opgebouwd.

use std::collections::BTreeMap;

use crate::graph::node::MetaMap;
use crate::graph::value::Value;

use super::{Component, ComponentError, ComponentResult};

pub const PIN_INPUT_A: &str = "A";
pub const PIN_INPUT_B: &str = "B";
pub const PIN_INPUT_BLENDER: &str = "Blender";

pub const PIN_OUTPUT: &str = "Output";

/// Beschikbare componenten binnen deze module.
#[derive(Debug, Clone, Copy)]
pub enum ComponentKind {
    /// Lineaire overgang tussen A en B, gewogen door de blender-pin.
    Blend,
    Divide,
    Multiply,
    Add,
}

/// Volledige lijst met componentregistraties voor de scalaire operatoren.
pub const REGISTRATIONS: &[super::Registration] = &[
    super::Registration {
        names: &["Blend"],
        kind: super::ComponentKind::Scalar(ComponentKind::Blend),
    },
    super::Registration {
        names: &["Divide"],
        kind: super::ComponentKind::Scalar(ComponentKind::Divide),
    },
    super::Registration {
        names: &["Multiply"],
        kind: super::ComponentKind::Scalar(ComponentKind::Multiply),
    },
    super::Registration {
        names: &["Add"],
        kind: super::ComponentKind::Scalar(ComponentKind::Add),
    },
];

impl ComponentKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Blend => "Blend",
            Self::Divide => "Divide",
            Self::Multiply => "Multiply",
            Self::Add => "Add",
        }
    }
}

impl Component for ComponentKind {
    fn evaluate(&self, inputs: &[Value], _meta: &MetaMap) -> ComponentResult {
        match self {
            Self::Blend => evaluate_blend(inputs),
            Self::Divide => evaluate_divide(inputs),
            Self::Multiply => evaluate_binary(inputs, "vermenigvuldigen", |a, b| a * b),
            Self::Add => evaluate_binary(inputs, "optellen", |a, b| a + b),
        }
    }
}

fn two_numbers(inputs: &[Value], verb: &str) -> Result<(f64, f64), ComponentError> {
    if inputs.len() < 2 {
        return Err(ComponentError::new(format!(
            "{verb} vereist twee numerieke inputs"
        )));
    }
    Ok((inputs[0].expect_number()?, inputs[1].expect_number()?))
}

fn evaluate_binary(
    inputs: &[Value],
    verb: &str,
    op: fn(f64, f64) -> f64,
) -> ComponentResult {
    let (a, b) = two_numbers(inputs, verb)?;
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT.to_owned(), Value::Number(op(a, b)));
    Ok(outputs)
}

fn evaluate_divide(inputs: &[Value]) -> ComponentResult {
    let (a, b) = two_numbers(inputs, "delen")?;
    if b == 0.0 || !b.is_finite() {
        return Err(ComponentError::new("delen door nul of niet-eindige noemer"));
    }
    let mut outputs = BTreeMap::new();
    outputs.insert(PIN_OUTPUT.to_owned(), Value::Number(a / b));
    Ok(outputs)
}

fn evaluate_blend(inputs: &[Value]) -> ComponentResult {
    if inputs.len() < 3 {
        return Err(ComponentError::new(
            "blend vereist inputs A, B en Blender",
        ));
    }
    let a = inputs[0].expect_number()?;
    let b = inputs[1].expect_number()?;
    let weight = inputs[2].expect_number()?.clamp(0.0, 1.0);

    let mut outputs = BTreeMap::new();
    outputs.insert(
        PIN_OUTPUT.to_owned(),
        Value::Number(a + (b - a) * weight),
    );
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(kind: ComponentKind, inputs: &[Value]) -> f64 {
        kind.evaluate(inputs, &MetaMap::new()).unwrap()[PIN_OUTPUT]
            .expect_number()
            .unwrap()
    }

    #[test]
    fn blend_interpolates_between_endpoints() {
        let inputs = [Value::Number(2.0), Value::Number(4.0), Value::Number(0.5)];
        assert_eq!(eval(ComponentKind::Blend, &inputs), 3.0);
    }

    #[test]
    fn blend_weight_is_clamped() {
        let low = [Value::Number(2.0), Value::Number(4.0), Value::Number(-1.0)];
        let high = [Value::Number(2.0), Value::Number(4.0), Value::Number(7.0)];
        assert_eq!(eval(ComponentKind::Blend, &low), 2.0);
        assert_eq!(eval(ComponentKind::Blend, &high), 4.0);
    }

    #[test]
    fn divide_rejects_zero_denominator() {
        let inputs = [Value::Number(1.0), Value::Number(0.0)];
        assert!(ComponentKind::Divide
            .evaluate(&inputs, &MetaMap::new())
            .is_err());
    }

    #[test]
    fn multiply_and_add_operate_pairwise() {
        assert_eq!(
            eval(
                ComponentKind::Multiply,
                &[Value::Number(0.4), Value::Number(0.5)]
            ),
            0.2
        );
        assert_eq!(
            eval(ComponentKind::Add, &[Value::Number(0.4), Value::Number(0.1)]),
            0.5
        );
    }
}
