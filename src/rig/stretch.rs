//! Het gedeelde stretchnetwerk: booglengte → blend → ratio.

use crate::components::{curve_measure, scalar, surface_attach};
use crate::graph::node::{Node, NodeId};
use crate::graph::value::Value;
use crate::graph::wire::Wire;
use crate::graph::{Graph, GraphError};

use super::names;

/// Per-rig stretchtoestand. `rest_length` wordt eenmalig bij de bouw
/// vastgelegd; de blend- en ratio-nodes rekenen daarna live.
///
/// De blendweging komt binnen op de `Blender`-pin (0 → rustlengte,
/// 1 → huidige lengte), zodat de ratio `effectieve rustlengte / huidige
/// lengte` zonder aparte takken zowel rekbaar als vergrendeld gedrag dekt.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchState {
    /// Booglengte van de middenlijn op bouwtijd.
    pub rest_length: f64,
    /// Arc Length-node op de middenlijn.
    pub arc_length_node: NodeId,
    /// Blend-node die de effectieve rustlengte bepaalt.
    pub blend_node: NodeId,
    /// Divide-node die de stretchratio produceert.
    pub ratio_node: NodeId,
}

/// Bouwt het stretchnetwerk boven een middenlijnnode en legt de rustlengte
/// vast.
pub fn build_stretch_network(
    graph: &mut Graph,
    curve_name: &str,
    centerline_node: NodeId,
    rest_length: f64,
) -> Result<StretchState, GraphError> {
    let mut arc = Node::component("Arc Length").with_nickname(names::arc_length(curve_name));
    arc.add_input_pin(curve_measure::PIN_INPUT_CURVE);
    let arc_length_node = graph.add_node(arc)?;
    graph.add_wire(Wire::new(
        centerline_node,
        surface_attach::PIN_OUTPUT_CURVE,
        arc_length_node,
        curve_measure::PIN_INPUT_CURVE,
    ))?;

    let mut blend = Node::component("Blend").with_nickname(names::stretch_blend(curve_name));
    blend.set_input(scalar::PIN_INPUT_A, Value::Number(rest_length));
    blend.add_input_pin(scalar::PIN_INPUT_B);
    blend.set_input(scalar::PIN_INPUT_BLENDER, Value::Number(0.0));
    let blend_node = graph.add_node(blend)?;
    graph.add_wire(Wire::new(
        arc_length_node,
        curve_measure::PIN_OUTPUT_LENGTH,
        blend_node,
        scalar::PIN_INPUT_B,
    ))?;

    let mut ratio = Node::component("Divide").with_nickname(names::stretch_ratio(curve_name));
    ratio.add_input_pin(scalar::PIN_INPUT_A);
    ratio.add_input_pin(scalar::PIN_INPUT_B);
    let ratio_node = graph.add_node(ratio)?;
    graph.add_wire(Wire::new(
        blend_node,
        scalar::PIN_OUTPUT,
        ratio_node,
        scalar::PIN_INPUT_A,
    ))?;
    graph.add_wire(Wire::new(
        arc_length_node,
        curve_measure::PIN_OUTPUT_LENGTH,
        ratio_node,
        scalar::PIN_INPUT_B,
    ))?;

    Ok(StretchState {
        rest_length,
        arc_length_node,
        blend_node,
        ratio_node,
    })
}
