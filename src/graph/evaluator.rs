//! Evaluatie van de riggraph in topologische volgorde.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use crate::components::{ComponentError, ComponentRegistry, OutputMap};
use crate::graph::Graph;
use crate::graph::node::{Node, NodeId};
use crate::graph::topo::{Topology, TopologyError};
use crate::graph::value::Value;

/// Resultaat van een evaluatie-run.
#[derive(Debug, Default, Clone)]
pub struct EvaluationResult {
    /// Uitgangen per node.
    pub node_outputs: HashMap<NodeId, BTreeMap<String, Value>>,
}

impl EvaluationResult {
    /// Leest één outputwaarde van één node.
    #[must_use]
    pub fn output(&self, node: NodeId, pin: &str) -> Option<&Value> {
        self.node_outputs.get(&node).and_then(|pins| pins.get(pin))
    }
}

/// Voorbereide metadata die hergebruik van topologie en verbindingen mogelijk
/// maakt.
#[derive(Debug, Clone, Default)]
pub struct EvaluationPlan {
    order: Vec<NodeId>,
    incoming: HashMap<NodeId, HashMap<String, Vec<(NodeId, String)>>>,
    downstream: HashMap<NodeId, Vec<NodeId>>,
    pin_order: HashMap<NodeId, Vec<String>>,
}

impl EvaluationPlan {
    /// Bouwt een evaluatieplan op basis van een graph.
    pub fn new(graph: &Graph) -> Result<Self, EvaluationError> {
        let topology = Topology::sort(graph)?;

        let mut incoming: HashMap<NodeId, HashMap<String, Vec<(NodeId, String)>>> = HashMap::new();
        let mut downstream: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for wire in graph.wires() {
            incoming
                .entry(wire.to_node)
                .or_default()
                .entry(wire.to_pin.0.clone())
                .or_default()
                .push((wire.from_node, wire.from_pin.0.clone()));
            downstream
                .entry(wire.from_node)
                .or_default()
                .push(wire.to_node);
        }

        for per_node in incoming.values_mut() {
            for connections in per_node.values_mut() {
                connections.sort();
            }
        }
        for neighbours in downstream.values_mut() {
            neighbours.sort();
            neighbours.dedup();
        }

        let mut pin_order = HashMap::new();
        for node in graph.nodes() {
            let mut pins: Vec<String> = node.input_order().to_vec();
            if let Some(connections) = incoming.get(&node.id) {
                let mut extra: Vec<String> = connections.keys().cloned().collect();
                extra.sort();
                for pin in extra {
                    if !pins.iter().any(|existing| existing == &pin) {
                        pins.push(pin);
                    }
                }
            }
            pin_order.insert(node.id, pins);
        }

        Ok(Self {
            order: topology.order,
            incoming,
            downstream,
            pin_order,
        })
    }

    #[must_use]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    fn incoming_connections(&self, node: NodeId, pin: &str) -> Option<&Vec<(NodeId, String)>> {
        self.incoming
            .get(&node)
            .and_then(|node_map| node_map.get(pin))
    }

    fn pins(&self, node: NodeId) -> &[String] {
        self.pin_order
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sluit de dirty-verzameling af over alle stroomafwaartse nodes.
    #[must_use]
    fn dirty_closure(&self, dirty: &HashSet<NodeId>) -> HashSet<NodeId> {
        let mut closure: HashSet<NodeId> = dirty.clone();
        let mut queue: VecDeque<NodeId> = dirty.iter().copied().collect();
        while let Some(node) = queue.pop_front() {
            if let Some(neighbours) = self.downstream.get(&node) {
                for &neighbour in neighbours {
                    if closure.insert(neighbour) {
                        queue.push_back(neighbour);
                    }
                }
            }
        }
        closure
    }
}

/// Fouttype voor evaluatieproblemen.
#[derive(Debug)]
pub enum EvaluationError {
    /// Topologiesortering is mislukt.
    Topology(TopologyError),
    /// De node heeft geen bijbehorend component.
    ComponentNotFound {
        node_id: NodeId,
        name: Option<String>,
        nickname: Option<String>,
    },
    /// Een vereiste input ontbreekt.
    MissingInput { node_id: NodeId, pin: String },
    /// Een output van een afhankelijke node ontbreekt.
    MissingDependencyOutput {
        node_id: NodeId,
        dependency: NodeId,
        pin: String,
    },
    /// Het component gaf een foutmelding tijdens evaluatie.
    ComponentFailed {
        node_id: NodeId,
        component: String,
        source: ComponentError,
    },
    /// De node kon niet teruggevonden worden in de graph (inconsistentie).
    UnknownNode(NodeId),
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topology(err) => write!(f, "topologiesortering mislukt: {err}"),
            Self::ComponentNotFound {
                node_id,
                name,
                nickname,
            } => write!(
                f,
                "geen component gevonden voor node {} (name={:?}, nickname={:?})",
                node_id.0, name, nickname
            ),
            Self::MissingInput { node_id, pin } => {
                write!(f, "node {} mist verplichte input `{pin}`", node_id.0)
            }
            Self::MissingDependencyOutput {
                node_id,
                dependency,
                pin,
            } => write!(
                f,
                "node {} mist output `{pin}` van afhankelijke node {}",
                node_id.0, dependency.0
            ),
            Self::ComponentFailed {
                node_id,
                component,
                source,
            } => write!(
                f,
                "component `{component}` (node {}) faalde: {}",
                node_id.0, source
            ),
            Self::UnknownNode(node_id) => {
                write!(f, "node {} bestaat niet in de graph", node_id.0)
            }
        }
    }
}

impl std::error::Error for EvaluationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ComponentFailed { source, .. } => Some(source),
            Self::Topology(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TopologyError> for EvaluationError {
    fn from(error: TopologyError) -> Self {
        Self::Topology(error)
    }
}

/// Evalueert een graph met behulp van de opgegeven componentregistry.
pub fn evaluate(
    graph: &Graph,
    registry: &ComponentRegistry,
) -> Result<EvaluationResult, EvaluationError> {
    let plan = EvaluationPlan::new(graph)?;
    evaluate_with_plan(graph, registry, &plan)
}

/// Evalueert een graph met behulp van een vooraf opgebouwd evaluatieplan.
pub fn evaluate_with_plan(
    graph: &Graph,
    registry: &ComponentRegistry,
    plan: &EvaluationPlan,
) -> Result<EvaluationResult, EvaluationError> {
    let mut result = EvaluationResult::default();

    for &node_id in plan.order() {
        let node = graph
            .node(node_id)
            .ok_or(EvaluationError::UnknownNode(node_id))?;
        let outputs = evaluate_node(node, registry, plan, &result)?;
        result.node_outputs.insert(node_id, outputs);
    }

    Ok(result)
}

/// Evalueert alleen de nodes in (of stroomafwaarts van) de dirty-verzameling
/// en hergebruikt eerdere outputs voor de rest. Geeft naast het resultaat de
/// verzameling daadwerkelijk herberekende nodes terug.
pub fn evaluate_with_plan_incremental(
    graph: &Graph,
    registry: &ComponentRegistry,
    plan: &EvaluationPlan,
    previous: Option<&EvaluationResult>,
    dirty: &HashSet<NodeId>,
) -> Result<(EvaluationResult, HashSet<NodeId>), EvaluationError> {
    let closure = plan.dirty_closure(dirty);
    let mut result = EvaluationResult::default();
    let mut changed = HashSet::new();

    for &node_id in plan.order() {
        let reusable = !closure.contains(&node_id);
        if reusable {
            if let Some(outputs) = previous.and_then(|prev| prev.node_outputs.get(&node_id)) {
                result.node_outputs.insert(node_id, outputs.clone());
                continue;
            }
        }

        let node = graph
            .node(node_id)
            .ok_or(EvaluationError::UnknownNode(node_id))?;
        let outputs = evaluate_node(node, registry, plan, &result)?;
        result.node_outputs.insert(node_id, outputs);
        changed.insert(node_id);
    }

    Ok((result, changed))
}

fn evaluate_node(
    node: &Node,
    registry: &ComponentRegistry,
    plan: &EvaluationPlan,
    result: &EvaluationResult,
) -> Result<BTreeMap<String, Value>, EvaluationError> {
    let node_id = node.id;
    let component = registry.resolve(node.name.as_deref()).ok_or_else(|| {
        EvaluationError::ComponentNotFound {
            node_id,
            name: node.name.clone(),
            nickname: node.nickname.clone(),
        }
    })?;

    let pins = plan.pins(node_id);
    let mut input_values = Vec::with_capacity(pins.len());

    for pin in pins {
        let value = if let Some(connections) = plan.incoming_connections(node_id, pin) {
            let mut values = Vec::with_capacity(connections.len());
            for (from_node, from_pin) in connections {
                let outputs = result.node_outputs.get(from_node).ok_or_else(|| {
                    EvaluationError::MissingDependencyOutput {
                        node_id,
                        dependency: *from_node,
                        pin: from_pin.clone(),
                    }
                })?;

                let value = outputs.get(from_pin).ok_or_else(|| {
                    EvaluationError::MissingDependencyOutput {
                        node_id,
                        dependency: *from_node,
                        pin: from_pin.clone(),
                    }
                })?;
                values.push(value.clone());
            }

            if values.len() == 1 {
                values.into_iter().next().unwrap()
            } else {
                Value::List(values)
            }
        } else if let Some(default) = node.inputs.get(pin) {
            default.clone()
        } else {
            return Err(EvaluationError::MissingInput {
                node_id,
                pin: pin.clone(),
            });
        };

        input_values.push(value);
    }

    let outputs = component
        .evaluate(&input_values, &node.meta)
        .map_err(|error| EvaluationError::ComponentFailed {
            node_id,
            component: component.name().to_owned(),
            source: error,
        })?;

    Ok(merge_outputs(node.outputs.clone(), outputs))
}

fn merge_outputs(
    mut existing: BTreeMap<String, Value>,
    new_outputs: OutputMap,
) -> BTreeMap<String, Value> {
    for (pin, value) in new_outputs {
        existing.insert(pin, value);
    }
    existing
}
