//! Verbindingen tussen nodes.

use super::node::NodeId;

/// Pin binnen een node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinId(pub String);

impl From<&str> for PinId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PinId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Verbinding tussen een output-pin en een input-pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Wire {
    pub from_node: NodeId,
    pub from_pin: PinId,
    pub to_node: NodeId,
    pub to_pin: PinId,
}

impl Wire {
    #[must_use]
    pub fn new<F, T, PF, PT>(from_node: F, from_pin: PF, to_node: T, to_pin: PT) -> Self
    where
        F: Into<NodeId>,
        T: Into<NodeId>,
        PF: Into<PinId>,
        PT: Into<PinId>,
    {
        Self {
            from_node: from_node.into(),
            from_pin: from_pin.into(),
            to_node: to_node.into(),
            to_pin: to_pin.into(),
        }
    }
}
