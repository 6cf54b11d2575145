use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three operation classes the server understands. The kind is fixed when
/// the operation is built and is the only input to transport routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Read,
    Write,
    Subscribe,
}

/// A named operation sent to the server, together with its variables.
///
/// Wire form is JSON: `{"kind": "...", "name": "...", "variables": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl Operation {
    pub fn read(name: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Read,
            name: name.into(),
            variables: Map::new(),
        }
    }

    pub fn write(name: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Write,
            name: name.into(),
            variables: Map::new(),
        }
    }

    pub fn subscribe(name: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Subscribe,
            name: name.into(),
            variables: Map::new(),
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}
