//! Definitie van nodes binnen de riggraph.

use std::collections::BTreeMap;

use super::value::Value;

/// Identifier voor een node binnen de graph.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

/// Waarde die meta-informatie over een node beschrijft (bv. stripbreedte of
/// spantelling van een component-instantie).
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl MetaValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for MetaValue {
    fn from(value: usize) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Alias voor een verzameling meta-informatie.
pub type MetaMap = BTreeMap<String, MetaValue>;

/// Node-representatie binnen de graph.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Unieke identifier binnen de graph.
    pub id: NodeId,
    /// Naam van het componenttype dat deze node uitvoert.
    pub name: Option<String>,
    /// Scene-naam van deze instantie, afgeleid van de curvenaam.
    pub nickname: Option<String>,
    /// Constante ingangswaarden, per pinnaam.
    pub inputs: BTreeMap<String, Value>,
    /// Registratie van de gedeclareerde pinvolgorde.
    input_order: Vec<String>,
    /// Uitgangswaarden, per pinnaam.
    pub outputs: BTreeMap<String, Value>,
    /// Verdere metadata, zoals componentconfiguratie.
    pub meta: MetaMap,
}

impl Node {
    #[must_use]
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Maakt een node aan voor het gegeven componenttype.
    #[must_use]
    pub fn component(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            ..Self::default()
        }
    }

    /// Builder-stijl: zet de scene-naam van deze instantie.
    #[must_use]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Declareert een inputpin zonder standaardwaarde.
    pub fn add_input_pin(&mut self, pin: &str) {
        if !self.input_order.iter().any(|existing| existing == pin) {
            self.input_order.push(pin.to_owned());
        }
    }

    /// Zet een constante inputwaarde en registreert de pinvolgorde.
    pub fn set_input(&mut self, pin: &str, value: Value) {
        self.add_input_pin(pin);
        self.inputs.insert(pin.to_owned(), value);
    }

    /// Zet een outputwaarde (bv. door de engine bij een parameternode).
    pub fn set_output(&mut self, pin: impl Into<String>, value: Value) {
        self.outputs.insert(pin.into(), value);
    }

    /// Zet een meta-waarde.
    pub fn insert_meta(&mut self, key: &str, value: impl Into<MetaValue>) {
        self.meta.insert(key.to_owned(), value.into());
    }

    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.get(key)
    }

    #[must_use]
    pub fn input_order(&self) -> &[String] {
        &self.input_order
    }
}
