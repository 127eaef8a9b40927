// Artifactory MCP Gateway - Value Codec
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Bidirectional conversion between bridge values and JSON. Encoding is
// total: every value has a JSON rendering, worst case an opaque handle.
// Decoding recognizes three escape shapes — handle, bytes, path — only
// when the object has exactly that one key; anything else falls through
// to structural decode.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Map, Value as Json};
use std::sync::Arc;

use crate::bridge::BridgeObject;
use crate::client::{create_path, resolve_base_url, ArtifactoryPath};
use crate::errors::BridgeError;
use crate::handles::HandleStore;
use crate::settings::ServerSettings;

/// A value crossing the bridge boundary.
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Ordered key/value pairs; order survives encoding.
    Map(Vec<(String, Value)>),
    Path(ArtifactoryPath),
    /// Lazy sequence. Encoding drains it destructively up to the item cap.
    Lazy(Box<dyn Iterator<Item = Value> + Send>),
    /// An error captured as a value (not a raised failure).
    Caught { class: String, message: String },
    /// Anything with no JSON shape; encoded as a handle.
    Object(Arc<dyn BridgeObject>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({:?})", v),
            Value::Int(v) => write!(f, "Int({:?})", v),
            Value::Float(v) => write!(f, "Float({:?})", v),
            Value::Str(v) => write!(f, "Str({:?})", v),
            Value::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Value::Path(v) => f.debug_tuple("Path").field(v).finish(),
            Value::Lazy(_) => write!(f, "Lazy(..)"),
            Value::Caught { class, message } => f
                .debug_struct("Caught")
                .field("class", class)
                .field("message", message)
                .finish(),
            Value::Object(object) => write!(f, "Object({})", object.class_name()),
        }
    }
}

impl Value {
    /// Runtime type name reported in invocation envelopes.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "none".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Bytes(_) => "bytes".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Path(_) => "ArtifactoryPath".to_string(),
            Value::Lazy(_) => "iterator".to_string(),
            Value::Caught { .. } => "exception".to_string(),
            Value::Object(object) => object.class_name().to_string(),
        }
    }

    /// Structural conversion from plain JSON — no escape shapes, no
    /// handle resolution. Used to wrap JSON returned by the REST client.
    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::Map(
                map.iter()
                    .map(|(key, item)| (key.clone(), Value::from_json(item)))
                    .collect(),
            ),
        }
    }
}

/// Encode a value into its JSON-safe rendering.
///
/// Each collection level gets its own truncation accounting against
/// max_items. When create_handles is false, opaque objects degrade to a
/// textual repr instead of registering a handle.
pub fn encode(value: Value, max_items: usize, create_handles: bool, store: &HandleStore) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => serde_json::Number::from_f64(f).map(Json::Number).unwrap_or(Json::Null),
        Value::Str(s) => Json::String(s),
        Value::Bytes(bytes) => json!({
            "type": "bytes",
            "size": bytes.len(),
            "base64": BASE64.encode(&bytes),
        }),
        Value::Path(path) => encode_path(&path),
        Value::Map(pairs) => {
            let mut output = Map::new();
            for (key, item) in pairs {
                output.insert(key, encode(item, max_items, create_handles, store));
            }
            Json::Object(output)
        }
        Value::List(items) => {
            let total = items.len();
            let encoded: Vec<Json> = items
                .into_iter()
                .take(max_items)
                .map(|item| encode(item, max_items, create_handles, store))
                .collect();
            if total > max_items {
                json!({
                    "type": "truncated_list",
                    "items": encoded,
                    "total": total,
                    "returned": max_items,
                })
            } else {
                Json::Array(encoded)
            }
        }
        Value::Lazy(iter) => {
            let (consumed, truncated) = drain_with_limit(iter, max_items);
            let returned = consumed.len();
            let encoded: Vec<Json> = consumed
                .into_iter()
                .map(|item| encode(item, max_items, create_handles, store))
                .collect();
            json!({
                "type": "iterator",
                "items": encoded,
                "truncated": truncated,
                "returned": returned,
            })
        }
        Value::Caught { class, message } => json!({
            "type": "exception",
            "class": class,
            "message": message,
        }),
        Value::Object(object) => {
            if create_handles {
                let class_name = object.class_name().to_string();
                let summary = object.summary();
                let handle_id = store.put(object);
                json!({
                    "type": "handle",
                    "handle_id": handle_id,
                    "class_name": class_name,
                    "summary": summary,
                })
            } else {
                json!({ "type": "repr", "value": object.summary() })
            }
        }
    }
}

/// Repository path objects serialize to a structured reference, never a
/// handle.
fn encode_path(path: &ArtifactoryPath) -> Json {
    json!({
        "type": "artifactory_path",
        "uri": path.uri(),
        "repository": path.repository(),
        "path": path.path_in_repo(),
    })
}

fn drain_with_limit(
    iter: Box<dyn Iterator<Item = Value> + Send>,
    max_items: usize,
) -> (Vec<Value>, bool) {
    let mut output = Vec::new();
    let mut truncated = false;
    for item in iter {
        if output.len() >= max_items {
            truncated = true;
            break;
        }
        output.push(item);
    }
    (output, truncated)
}

/// Decode a JSON argument into a bridge value, resolving the three escape
/// shapes. Scalars pass through unchanged; arrays and objects decode
/// recursively.
pub fn decode(
    json: &Json,
    store: &HandleStore,
    settings: &ServerSettings,
) -> Result<Value, BridgeError> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(0.0)),
        }),
        Json::String(s) => Ok(Value::Str(s.clone())),
        Json::Array(items) => {
            let decoded: Result<Vec<Value>, BridgeError> =
                items.iter().map(|item| decode(item, store, settings)).collect();
            Ok(Value::List(decoded?))
        }
        Json::Object(map) => decode_special(map, store, settings),
    }
}

/// Escape shapes match only on a single-key object; an object carrying
/// extra keys alongside a marker falls through to structural decode.
fn decode_special(
    map: &Map<String, Json>,
    store: &HandleStore,
    settings: &ServerSettings,
) -> Result<Value, BridgeError> {
    if map.len() == 1 {
        if let Some(raw) = map.get("__handle_id__") {
            let handle_id = raw.as_str().ok_or_else(|| {
                BridgeError::validation("__handle_id__ must be a string.")
            })?;
            return Ok(Value::Object(store.get(handle_id)?));
        }

        if let Some(raw) = map.get("__bytes_base64__") {
            let encoded = raw.as_str().ok_or_else(|| {
                BridgeError::validation("__bytes_base64__ must be a string.")
            })?;
            let bytes = BASE64
                .decode(encoded)
                .map_err(|_| BridgeError::validation("Invalid __bytes_base64__ payload."))?;
            return Ok(Value::Bytes(bytes));
        }

        if let Some(raw) = map.get("__path__") {
            let path_ref = raw
                .as_object()
                .ok_or_else(|| BridgeError::validation("__path__ must be an object."))?;

            let repository = path_ref
                .get("repository")
                .and_then(|v| v.as_str())
                .ok_or_else(|| BridgeError::validation("__path__.repository must be a string."))?;
            let rel_path = match path_ref.get("path") {
                None => "",
                Some(Json::String(s)) => s.as_str(),
                Some(_) => {
                    return Err(BridgeError::validation("__path__.path must be a string."));
                }
            };
            let base_url = match path_ref.get("base_url") {
                None | Some(Json::Null) => None,
                Some(Json::String(s)) => Some(s.as_str()),
                Some(_) => {
                    return Err(BridgeError::validation(
                        "__path__.base_url must be a string if provided.",
                    ));
                }
            };

            let resolved = resolve_base_url(base_url, settings)?;
            return Ok(Value::Path(create_path(&resolved, repository, rel_path, settings)?));
        }
    }

    let mut decoded = Vec::with_capacity(map.len());
    for (key, item) in map {
        decoded.push((key.clone(), decode(item, store, settings)?));
    }
    Ok(Value::Map(decoded))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{CallArgs, CallOutcome, MemberSpec};

    struct Opaque;

    impl BridgeObject for Opaque {
        fn class_name(&self) -> &'static str {
            "Opaque"
        }
        fn summary(&self) -> String {
            "Opaque()".to_string()
        }
        fn members(&self) -> &'static [MemberSpec] {
            &[]
        }
        fn call(&self, name: &str, _args: CallArgs) -> Result<CallOutcome, BridgeError> {
            Err(BridgeError::not_found(format!("Method {:?} not found.", name)))
        }
    }

    fn settings() -> ServerSettings {
        ServerSettings {
            artifactory_base_url: Some("https://repo.example.com/artifactory".into()),
            ..ServerSettings::default()
        }
    }

    // === SCALARS ===

    #[test]
    fn scalars_pass_through_unchanged() {
        let store = HandleStore::new();
        assert_eq!(encode(Value::Null, 10, true, &store), Json::Null);
        assert_eq!(encode(Value::Bool(true), 10, true, &store), json!(true));
        assert_eq!(encode(Value::Int(-7), 10, true, &store), json!(-7));
        assert_eq!(encode(Value::Float(2.5), 10, true, &store), json!(2.5));
        assert_eq!(
            encode(Value::Str("naïve £ string".into()), 10, true, &store),
            json!("naïve £ string")
        );
    }

    // === BYTES ROUND TRIP ===

    #[test]
    fn bytes_round_trip_exactly() {
        let store = HandleStore::new();
        let cases: Vec<Vec<u8>> = vec![vec![], vec![0u8], vec![0xde, 0xad, 0xbe, 0xef], b"hello".to_vec()];
        for original in cases {
            let encoded = encode(Value::Bytes(original.clone()), 10, true, &store);
            assert_eq!(encoded["type"], "bytes");
            assert_eq!(encoded["size"], json!(original.len()));

            let reference = json!({ "__bytes_base64__": encoded["base64"] });
            match decode(&reference, &store, &settings()).unwrap() {
                Value::Bytes(decoded) => assert_eq!(decoded, original),
                other => panic!("expected bytes, got {}", other.type_name()),
            }
        }
    }

    #[test]
    fn invalid_base64_payload_rejected() {
        let store = HandleStore::new();
        let err = decode(&json!({"__bytes_base64__": "!!!"}), &store, &settings()).unwrap_err();
        assert!(err.to_string().contains("Invalid __bytes_base64__"), "got: {}", err);

        let err = decode(&json!({"__bytes_base64__": 42}), &store, &settings()).unwrap_err();
        assert!(err.to_string().contains("must be a string"), "got: {}", err);
    }

    // === TRUNCATION ===

    #[test]
    fn long_list_wraps_with_counts() {
        let store = HandleStore::new();
        let items: Vec<Value> = (0..5).map(Value::Int).collect();
        let encoded = encode(Value::List(items), 3, true, &store);
        assert_eq!(
            encoded,
            json!({"type": "truncated_list", "items": [0, 1, 2], "total": 5, "returned": 3})
        );
    }

    #[test]
    fn short_list_stays_plain() {
        let store = HandleStore::new();
        let items: Vec<Value> = (0..3).map(Value::Int).collect();
        assert_eq!(encode(Value::List(items), 3, true, &store), json!([0, 1, 2]));
    }

    #[test]
    fn nested_collections_get_independent_budgets() {
        let store = HandleStore::new();
        let inner: Vec<Value> = (0..4).map(Value::Int).collect();
        let outer = Value::List(vec![Value::List(inner), Value::Int(99)]);
        let encoded = encode(outer, 2, true, &store);
        // Outer fits in the cap; inner is truncated on its own account.
        assert_eq!(encoded[0]["type"], "truncated_list");
        assert_eq!(encoded[0]["returned"], json!(2));
        assert_eq!(encoded[0]["total"], json!(4));
        assert_eq!(encoded[1], json!(99));
    }

    #[test]
    fn lazy_sequences_drain_destructively() {
        let store = HandleStore::new();
        let iter = Box::new((0..10).map(Value::Int));
        let encoded = encode(Value::Lazy(iter), 4, true, &store);
        assert_eq!(encoded["type"], "iterator");
        assert_eq!(encoded["items"], json!([0, 1, 2, 3]));
        assert_eq!(encoded["truncated"], json!(true));
        assert_eq!(encoded["returned"], json!(4));
    }

    #[test]
    fn short_lazy_sequence_not_marked_truncated() {
        let store = HandleStore::new();
        let iter = Box::new((0..2).map(Value::Int));
        let encoded = encode(Value::Lazy(iter), 4, true, &store);
        assert_eq!(encoded["truncated"], json!(false));
        assert_eq!(encoded["returned"], json!(2));
    }

    // === MAPS ===

    #[test]
    fn map_keys_preserve_order() {
        let store = HandleStore::new();
        let map = Value::Map(vec![
            ("zulu".into(), Value::Int(1)),
            ("alpha".into(), Value::Int(2)),
            ("mike".into(), Value::Int(3)),
        ]);
        let encoded = encode(map, 10, true, &store);
        let keys: Vec<&String> = encoded.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zulu", "alpha", "mike"]);
    }

    // === EXCEPTION VALUES ===

    #[test]
    fn caught_errors_serialize_structurally() {
        let store = HandleStore::new();
        let caught = Value::Caught {
            class: "NotFound".into(),
            message: "missing".into(),
        };
        assert_eq!(
            encode(caught, 10, true, &store),
            json!({"type": "exception", "class": "NotFound", "message": "missing"})
        );
    }

    // === HANDLES ===

    #[test]
    fn opaque_object_becomes_handle_and_resolves_back() {
        let store = HandleStore::new();
        let object: Arc<dyn BridgeObject> = Arc::new(Opaque);
        let encoded = encode(Value::Object(Arc::clone(&object)), 10, true, &store);

        assert_eq!(encoded["type"], "handle");
        assert_eq!(encoded["class_name"], "Opaque");
        assert_eq!(encoded["summary"], "Opaque()");
        let handle_id = encoded["handle_id"].as_str().unwrap();
        assert_eq!(store.count(), 1);

        let reference = json!({ "__handle_id__": handle_id });
        match decode(&reference, &store, &settings()).unwrap() {
            Value::Object(resolved) => {
                assert!(Arc::ptr_eq(&resolved, &object), "handle must resolve to the stored object")
            }
            other => panic!("expected object, got {}", other.type_name()),
        }
    }

    #[test]
    fn handle_creation_can_be_suppressed() {
        let store = HandleStore::new();
        let encoded = encode(Value::Object(Arc::new(Opaque)), 10, false, &store);
        assert_eq!(encoded, json!({"type": "repr", "value": "Opaque()"}));
        assert_eq!(store.count(), 0, "suppressed encode must not register a handle");
    }

    #[test]
    fn unknown_handle_reference_fails() {
        let store = HandleStore::new();
        let err = decode(&json!({"__handle_id__": "h99"}), &store, &settings()).unwrap_err();
        assert!(err.to_string().contains("Unknown handle_id"), "got: {}", err);
    }

    // === SPECIAL-SHAPE RECOGNITION ===

    #[test]
    fn marker_with_extra_keys_falls_through_to_mapping() {
        let store = HandleStore::new();
        let json = json!({"__handle_id__": "h1", "note": "not a reference"});
        match decode(&json, &store, &settings()).unwrap() {
            Value::Map(pairs) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[0].0, "__handle_id__");
            }
            other => panic!("expected mapping fallthrough, got {}", other.type_name()),
        }
    }

    #[test]
    fn path_reference_uses_default_base_url() {
        let store = HandleStore::new();
        let reference = json!({
            "__path__": {"repository": "libs-release-local", "path": "com/x/y.jar"}
        });
        match decode(&reference, &store, &settings()).unwrap() {
            Value::Path(path) => {
                assert_eq!(
                    path.uri(),
                    "https://repo.example.com/artifactory/libs-release-local/com/x/y.jar"
                );
            }
            other => panic!("expected path, got {}", other.type_name()),
        }
    }

    #[test]
    fn path_reference_validates_sub_fields() {
        let store = HandleStore::new();
        let missing_repo = json!({"__path__": {"path": "a/b"}});
        assert!(decode(&missing_repo, &store, &settings()).is_err());

        let bad_shape = json!({"__path__": "libs-release-local/a/b"});
        assert!(decode(&bad_shape, &store, &settings()).is_err());

        let bad_base = json!({
            "__path__": {"repository": "r", "path": "a", "base_url": "not-a-url"}
        });
        assert!(decode(&bad_base, &store, &settings()).is_err());
    }

    #[test]
    fn path_encodes_to_structured_reference() {
        let store = HandleStore::new();
        let path = create_path(
            "https://repo.example.com/artifactory",
            "libs-release-local",
            "com/x/y.jar",
            &settings(),
        )
        .unwrap();
        let encoded = encode(Value::Path(path), 10, true, &store);
        assert_eq!(
            encoded,
            json!({
                "type": "artifactory_path",
                "uri": "https://repo.example.com/artifactory/libs-release-local/com/x/y.jar",
                "repository": "libs-release-local",
                "path": "com/x/y.jar",
            })
        );
        assert_eq!(store.count(), 0, "paths never become handles");
    }

    // === STRUCTURAL DECODE ===

    #[test]
    fn nested_arguments_decode_recursively() {
        let store = HandleStore::new();
        let json = json!({"outer": [1, {"__bytes_base64__": "aGk="}, "text"]});
        match decode(&json, &store, &settings()).unwrap() {
            Value::Map(pairs) => match &pairs[0].1 {
                Value::List(items) => {
                    assert!(matches!(items[0], Value::Int(1)));
                    assert!(matches!(&items[1], Value::Bytes(b) if b == b"hi"));
                    assert!(matches!(&items[2], Value::Str(s) if s == "text"));
                }
                other => panic!("expected list, got {}", other.type_name()),
            },
            other => panic!("expected map, got {}", other.type_name()),
        }
    }

    #[test]
    fn from_json_is_structural_only() {
        // Escape markers are NOT interpreted by from_json.
        let json = json!({"__handle_id__": "h1"});
        match Value::from_json(&json) {
            Value::Map(pairs) => assert_eq!(pairs[0].0, "__handle_id__"),
            other => panic!("expected map, got {}", other.type_name()),
        }
    }
}
