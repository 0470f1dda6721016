//! Whitelist sanitizer for client-facing output.
//!
//! Every entity reaching the response pipeline is reduced to the fields its
//! type declares in its whitelist, recursively through nested entities and
//! collections of entities. Anything the sanitizer does not recognise passes
//! through unchanged; it never fails.

mod inflect;
mod node;

pub use inflect::{plural, singular};
pub use node::{Entity, Node, Whitelistable};

/// Filter a value tree down to whitelisted fields.
pub fn sanitize(node: Node) -> Node {
    match node {
        Node::Array(items) => Node::Array(items.into_iter().map(sanitize).collect()),
        Node::Entity(entity) => Node::Entity(filter_entity(entity)),
        Node::Object(fields) => Node::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, descend(value)))
                .collect(),
        ),
        scalar @ Node::Scalar(_) => scalar,
    }
}

fn filter_entity(entity: Entity) -> Entity {
    let (whitelist, fields) = entity.into_parts();
    let kept = fields
        .into_iter()
        .filter(|(key, _)| is_retained(key, whitelist))
        .map(|(key, value)| (key, descend(value)))
        .collect();
    Entity::from_parts(whitelist, kept)
}

fn descend(value: Node) -> Node {
    if !is_sanitizable(&value) {
        return value;
    }
    match value {
        Node::Array(items) if items.is_empty() => Node::Array(Vec::new()),
        other => sanitize(other),
    }
}

/// Whether `key` (or its singular/plural form) is declared in `whitelist`.
pub fn is_retained(key: &str, whitelist: &[&str]) -> bool {
    if whitelist.contains(&key) {
        return true;
    }
    let plural = plural(key);
    let singular = singular(key);
    whitelist
        .iter()
        .any(|entry| *entry == plural || *entry == singular)
}

/// True if the node is an entity, or a collection directly holding at least
/// one entity.
pub fn has_eligible_member(node: &Node) -> bool {
    match node {
        Node::Entity(_) => true,
        Node::Array(items) => items.iter().any(|item| matches!(item, Node::Entity(_))),
        Node::Object(fields) => fields.iter().any(|(_, v)| matches!(v, Node::Entity(_))),
        Node::Scalar(_) => false,
    }
}

/// True for entities and for containers holding an entity somewhere below
/// them; false for scalars and plain data.
pub fn is_sanitizable(node: &Node) -> bool {
    match node {
        Node::Scalar(_) => false,
        Node::Entity(_) => true,
        Node::Array(items) => items.iter().any(is_sanitizable),
        Node::Object(fields) => fields.iter().any(|(_, v)| is_sanitizable(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER: &[&str] = &["id", "name", "media"];
    const MEDIA: &[&str] = &["id", "url"];

    fn media(id: i64) -> Node {
        Entity::new(MEDIA)
            .field("id", id)
            .field("url", format!("/m/{id}"))
            .field("storage_path", "/var/secret")
            .into()
    }

    fn user(medias: Vec<Node>) -> Node {
        Entity::new(USER)
            .field("id", 1)
            .field("name", "ada")
            .field("secret", "hunter2")
            .field("medias", medias)
            .into()
    }

    #[test]
    fn keeps_only_whitelisted_fields() {
        let e: Node = Entity::new(&["id", "name"])
            .field("id", 7)
            .field("name", "x")
            .field("secret", "s")
            .into();
        assert_eq!(sanitize(e).to_json(), json!({ "id": 7, "name": "x" }));
    }

    #[test]
    fn singular_entry_retains_plural_field_and_recurses() {
        let out = sanitize(user(vec![media(1), media(2)])).to_json();
        assert_eq!(
            out,
            json!({
                "id": 1,
                "name": "ada",
                "medias": [{ "id": 1, "url": "/m/1" }, { "id": 2, "url": "/m/2" }]
            })
        );
    }

    #[test]
    fn empty_nested_collection_stays_empty() {
        let out = sanitize(user(vec![])).to_json();
        assert_eq!(out["medias"], json!([]));
        assert!(out.get("secret").is_none());
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize(user(vec![media(3)]));
        let twice = sanitize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn arrays_are_processed_element_wise() {
        let list = Node::Array(vec![media(1), Node::from(json!("plain")), media(2)]);
        let out = sanitize(list).to_json();
        assert_eq!(
            out,
            json!([{ "id": 1, "url": "/m/1" }, "plain", { "id": 2, "url": "/m/2" }])
        );
    }

    #[test]
    fn plain_objects_are_transparent() {
        let payload = Node::object([("token", Node::from("abc")), ("user", user(vec![]))]);
        let out = sanitize(payload).to_json();
        assert_eq!(out["token"], json!("abc"));
        assert!(out["user"].get("secret").is_none());
    }

    #[test]
    fn plain_data_passes_through() {
        let v = Node::from(json!({ "a": [1, 2], "b": { "c": "d" } }));
        assert_eq!(sanitize(v.clone()), v);
        assert!(!is_sanitizable(&v));
        assert!(!has_eligible_member(&v));
    }

    #[test]
    fn eligibility() {
        assert!(has_eligible_member(&media(1)));
        assert!(has_eligible_member(&Node::Array(vec![Node::null(), media(1)])));
        assert!(has_eligible_member(&Node::object([("m", media(1))])));
        assert!(!has_eligible_member(&Node::Array(vec![])));
        assert!(!has_eligible_member(&Node::null()));
    }

    #[test]
    fn sanitizable_detects_deep_entities() {
        let nested = Node::Array(vec![Node::Array(vec![media(1)])]);
        assert!(is_sanitizable(&nested));
        assert!(!has_eligible_member(&nested));
        assert!(!is_sanitizable(&Node::from(json!([1, "a", null]))));
    }

    #[test]
    fn retention_matches_both_numbers() {
        assert!(is_retained("medias", &["media"]));
        assert!(is_retained("media", &["medias"]));
        assert!(is_retained("id", &["id"]));
        assert!(!is_retained("password", &["id", "username"]));
    }
}
