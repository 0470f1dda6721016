use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Capability implemented by every type that may be exposed to clients.
///
/// The whitelist is the ordered set of field names allowed in output.
pub trait Whitelistable {
    fn whitelist(&self) -> &'static [&'static str];
}

/// Value tree handed from handlers to the output pipeline.
///
/// Entities keep their whitelist alongside their fields so the sanitizer can
/// filter a graph of mixed entities and plain data without knowing the
/// concrete Rust types that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Value),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
    Entity(Entity),
}

/// A whitelisted record: declared fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    whitelist: &'static [&'static str],
    fields: Vec<(String, Node)>,
}

impl Entity {
    pub fn new(whitelist: &'static [&'static str]) -> Self {
        Self {
            whitelist,
            fields: Vec::new(),
        }
    }

    /// Builder-style field insertion. A repeated key replaces the earlier value.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn fields(&self) -> &[(String, Node)] {
        &self.fields
    }

    pub(crate) fn into_parts(self) -> (&'static [&'static str], Vec<(String, Node)>) {
        (self.whitelist, self.fields)
    }

    pub(crate) fn from_parts(
        whitelist: &'static [&'static str],
        fields: Vec<(String, Node)>,
    ) -> Self {
        Self { whitelist, fields }
    }
}

impl Whitelistable for Entity {
    fn whitelist(&self) -> &'static [&'static str] {
        self.whitelist
    }
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Value::Null)
    }

    /// Build a scalar from anything serializable. Values that fail to
    /// serialize degrade to `null`.
    pub fn scalar<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(Value::Array(items)) => Node::Array(items.into_iter().map(Node::from).collect()),
            Ok(Value::Object(map)) => Node::from(Value::Object(map)),
            Ok(v) => Node::Scalar(v),
            Err(e) => {
                tracing::warn!("Failed to convert value into output node: {}", e);
                Node::null()
            }
        }
    }

    pub fn list<T>(items: impl IntoIterator<Item = T>) -> Self
    where
        T: Into<Node>,
    {
        Node::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn object(fields: impl IntoIterator<Item = (impl Into<String>, Node)>) -> Self {
        Node::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Value::Null))
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Node::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Render the tree as plain JSON. Whitelists are dropped here; call the
    /// sanitizer first when the output is client-facing.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Scalar(v) => v.clone(),
            Node::Array(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Object(fields) => Value::Object(fields_to_map(fields)),
            Node::Entity(entity) => Value::Object(fields_to_map(&entity.fields)),
        }
    }
}

fn fields_to_map(fields: &[(String, Node)]) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
            other => Node::Scalar(other),
        }
    }
}

impl From<Entity> for Node {
    fn from(entity: Entity) -> Self {
        Node::Entity(entity)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Value::String(value.to_string()))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(Value::String(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Scalar(Value::from(value))
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Scalar(Value::from(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(Value::Bool(value))
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(Node::null)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WL: &[&str] = &["id", "name"];

    #[test]
    fn entity_insert_replaces_existing_key() {
        let e = Entity::new(WL).field("id", 1).field("name", "a").field("id", 2);
        assert_eq!(e.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(e.get("id"), Some(&Node::from(2)));
    }

    #[test]
    fn json_conversion_keeps_nesting() {
        let node = Node::from(json!({ "a": [1, { "b": null }] }));
        assert_eq!(node.to_json(), json!({ "a": [1, { "b": null }] }));
    }

    #[test]
    fn option_none_becomes_null() {
        let n: Node = Option::<String>::None.into();
        assert!(n.is_null());
    }
}
