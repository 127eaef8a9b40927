// Artifactory MCP Gateway - Method Invocation Bridge
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Generic reflective bridge: a remote caller names a method as a string
// and the engine dispatches it against the target's member table. This
// is an intentional dynamic-typing boundary — the only gate is the
// leading-underscore convention, not a security sandbox. Results flow
// back through the value codec, growing handles for anything opaque.

use serde_json::{json, Map, Value as Json};
use std::sync::Arc;

use crate::client::ArtifactoryPath;
use crate::errors::BridgeError;
use crate::handles::HandleStore;
use crate::models::{ArtifactStat, CapabilitiesResult, GenericMethodResult, MethodDescriptor};
use crate::settings::{validate_encoding, ServerSettings};
use crate::value::{decode, encode, Value};

/// How a name on a target behaves when addressed through the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Callable; dispatched through BridgeObject::call.
    Method,
    /// Data attribute. Exists, but invoking it is an error.
    Field,
}

/// One entry in a target's exposed operation set.
pub struct MemberSpec {
    pub name: &'static str,
    pub signature: &'static str,
    pub kind: MemberKind,
}

/// Decoded invocation arguments.
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn empty() -> Self {
        Self {
            positional: Vec::new(),
            keyword: Vec::new(),
        }
    }

    fn find(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.keyword.iter().find(|(key, _)| key == name).map(|(_, v)| v))
    }

    pub fn str_arg(&self, index: usize, name: &str, method: &str) -> Result<&str, BridgeError> {
        match self.find(index, name) {
            Some(Value::Str(s)) => Ok(s),
            Some(_) => Err(BridgeError::validation(format!(
                "Argument '{}' of method '{}' must be a string.",
                name, method
            ))),
            None => Err(BridgeError::validation(format!(
                "Method '{}' requires a '{}' argument.",
                method, name
            ))),
        }
    }

    pub fn opt_str_arg(
        &self,
        index: usize,
        name: &str,
        method: &str,
    ) -> Result<Option<&str>, BridgeError> {
        match self.find(index, name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(_) => Err(BridgeError::validation(format!(
                "Argument '{}' of method '{}' must be a string.",
                name, method
            ))),
        }
    }

    /// Raw bytes argument: a bytes escape shape, or a string taken as UTF-8.
    pub fn bytes_arg(&self, index: usize, name: &str, method: &str) -> Result<&[u8], BridgeError> {
        match self.find(index, name) {
            Some(Value::Bytes(bytes)) => Ok(bytes),
            Some(Value::Str(s)) => Ok(s.as_bytes()),
            Some(_) => Err(BridgeError::validation(format!(
                "Argument '{}' of method '{}' must be bytes (use __bytes_base64__).",
                name, method
            ))),
            None => Err(BridgeError::validation(format!(
                "Method '{}' requires a '{}' argument.",
                method, name
            ))),
        }
    }

    pub fn path_arg(
        &self,
        index: usize,
        name: &str,
        method: &str,
    ) -> Result<&ArtifactoryPath, BridgeError> {
        match self.find(index, name) {
            Some(Value::Path(path)) => Ok(path),
            Some(_) => Err(BridgeError::validation(format!(
                "Argument '{}' of method '{}' must be a path reference (use __path__).",
                name, method
            ))),
            None => Err(BridgeError::validation(format!(
                "Method '{}' requires a '{}' argument.",
                method, name
            ))),
        }
    }

    pub fn ensure_no_args(&self, method: &str) -> Result<(), BridgeError> {
        if self.positional.is_empty() && self.keyword.is_empty() {
            return Ok(());
        }
        Err(BridgeError::validation(format!(
            "Method '{}' takes no arguments.",
            method
        )))
    }
}

/// What a dispatched call produced.
pub enum CallOutcome {
    Value(Value),
    /// The method would yield a suspended computation. The bridge only
    /// supports synchronous targets, so the engine rejects this.
    Deferred,
}

/// A server-side object addressable through the bridge.
pub trait BridgeObject: Send + Sync {
    fn class_name(&self) -> &'static str;
    fn summary(&self) -> String;
    fn members(&self) -> &'static [MemberSpec];
    fn call(&self, name: &str, args: CallArgs) -> Result<CallOutcome, BridgeError>;
}

fn normalize_max_items(
    max_items: Option<i64>,
    settings: &ServerSettings,
) -> Result<usize, BridgeError> {
    match max_items {
        None => Ok(settings.mcp_default_max_items),
        Some(value) if (1..=10_000).contains(&value) => Ok(value as usize),
        Some(_) => Err(BridgeError::validation("max_items must be between 1 and 10000.")),
    }
}

/// Invoke a named method on a target, decoding JSON arguments and
/// encoding the result. Validation order: max_items range, empty name,
/// private prefix, member existence, callability, argument decode, call.
#[allow(clippy::too_many_arguments)]
pub fn invoke_method(
    store: &HandleStore,
    settings: &ServerSettings,
    target: &dyn BridgeObject,
    target_label: &str,
    method: &str,
    positional_args: &[Json],
    keyword_args: &Map<String, Json>,
    max_items: Option<i64>,
) -> Result<GenericMethodResult, BridgeError> {
    let resolved_max_items = normalize_max_items(max_items, settings)?;

    let name = method.trim();
    if name.is_empty() {
        return Err(BridgeError::validation("method cannot be empty."));
    }

    if name.starts_with('_') {
        return Err(BridgeError::Unsupported(format!(
            "Method '{}' is private/special and cannot be invoked. \
             Use public callables only (discover via list_artifactory_capabilities).",
            name
        )));
    }

    let member = target.members().iter().find(|member| member.name == name);
    let member = match member {
        Some(member) => member,
        None => {
            let candidates: Vec<&'static str> = target
                .members()
                .iter()
                .filter(|m| m.kind == MemberKind::Method)
                .map(|m| m.name)
                .collect();
            let suggestion = render_method_suggestions(name, &candidates);
            return Err(BridgeError::not_found(format!(
                "Method '{}' not found on target type {}. \
                 Call list_artifactory_capabilities for discoverability.{}",
                name,
                target.class_name(),
                suggestion
            )));
        }
    };

    if member.kind == MemberKind::Field {
        return Err(BridgeError::Unsupported(format!(
            "Attribute '{}' exists on target type {} but is not callable. \
             This bridge only supports method invocation.",
            name,
            target.class_name()
        )));
    }

    let positional: Result<Vec<Value>, BridgeError> = positional_args
        .iter()
        .map(|item| decode(item, store, settings))
        .collect();
    let keyword: Result<Vec<(String, Value)>, BridgeError> = keyword_args
        .iter()
        .map(|(key, item)| Ok((key.clone(), decode(item, store, settings)?)))
        .collect();
    let args = CallArgs {
        positional: positional?,
        keyword: keyword?,
    };

    let result = match target.call(name, args)? {
        CallOutcome::Value(value) => value,
        CallOutcome::Deferred => {
            return Err(BridgeError::Unsupported(format!(
                "Method '{}' returned a deferred result, which is not supported by this bridge.",
                name
            )));
        }
    };

    let result_type = result.type_name();
    let serialized = encode(result, resolved_max_items, true, store);
    Ok(GenericMethodResult {
        target: target_label.to_string(),
        method: name.to_string(),
        result_type,
        result: serialized,
    })
}

// ====== DID-YOU-MEAN ======

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Up to three close public method names, cut off so only genuinely
/// similar names surface. Empty string when nothing is close.
fn render_method_suggestions(name: &str, candidates: &[&'static str]) -> String {
    let mut scored: Vec<(&'static str, f64)> = candidates
        .iter()
        .map(|candidate| (*candidate, similarity(name, candidate)))
        .filter(|(_, score)| *score >= 0.5)
        .collect();
    if scored.is_empty() {
        return String::new();
    }
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let matches: Vec<&str> = scored.iter().take(3).map(|(name, _)| *name).collect();
    if matches.len() == 1 {
        format!(" Did you mean '{}'?", matches[0])
    } else {
        let rendered: Vec<String> = matches.iter().map(|m| format!("'{}'", m)).collect();
        format!(" Did you mean one of: {}?", rendered.join(", "))
    }
}

// ====== CAPABILITIES ======

/// Static discovery surface over the path object's public method set.
pub fn list_capabilities() -> CapabilitiesResult {
    let mut path_methods: Vec<MethodDescriptor> = PATH_MEMBERS
        .iter()
        .filter(|member| member.kind == MemberKind::Method)
        .map(|member| MethodDescriptor {
            name: member.name.to_string(),
            signature: member.signature.to_string(),
        })
        .collect();
    path_methods.sort_by(|a, b| a.name.cmp(&b.name));

    CapabilitiesResult {
        package: env!("CARGO_PKG_NAME").to_string(),
        package_version: env!("CARGO_PKG_VERSION").to_string(),
        path_method_count: path_methods.len(),
        path_methods,
        handle_workflow: vec![
            "Use invoke_artifactory_root_method or invoke_artifactory_path_method.".to_string(),
            "If a result includes a handle_id, pass {\"__handle_id__\": \"<id>\"} in later calls \
             or use invoke_artifactory_handle_method."
                .to_string(),
            "Use drop_artifactory_handle to release handles.".to_string(),
        ],
        argument_encodings: json!({
            "handle_ref": "{\"__handle_id__\": \"h1\"}",
            "path_ref": "{\"__path__\": {\"repository\": \"libs-release-local\", \"path\": \"com/example/app.jar\", \"base_url\": \"https://host/artifactory\"}}",
            "bytes": "{\"__bytes_base64__\": \"<base64-bytes>\"}",
        }),
    }
}

// ====== ARTIFACTORY PATH SURFACE ======

pub(crate) static PATH_MEMBERS: &[MemberSpec] = &[
    MemberSpec { name: "copy_to", signature: "(target: path_ref)", kind: MemberKind::Method },
    MemberSpec { name: "download_stats", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "exists", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "glob", signature: "(pattern: str)", kind: MemberKind::Method },
    MemberSpec { name: "is_dir", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "is_file", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "iterdir", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "joinpath", signature: "(segment: str)", kind: MemberKind::Method },
    MemberSpec { name: "mkdir", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "move_to", signature: "(target: path_ref)", kind: MemberKind::Method },
    MemberSpec { name: "name", signature: "str", kind: MemberKind::Field },
    MemberSpec { name: "parent", signature: "path", kind: MemberKind::Field },
    MemberSpec { name: "path_in_repo", signature: "str", kind: MemberKind::Field },
    MemberSpec { name: "ping", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "properties", signature: "map", kind: MemberKind::Field },
    MemberSpec { name: "read_bytes", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "read_text", signature: "(encoding: str = 'utf-8')", kind: MemberKind::Method },
    MemberSpec { name: "repositories", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "rmdir", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "stat", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "touch", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "unlink", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "version", signature: "()", kind: MemberKind::Method },
    MemberSpec { name: "write_bytes", signature: "(data: bytes_ref)", kind: MemberKind::Method },
    MemberSpec { name: "write_text", signature: "(content: str, encoding: str = 'utf-8')", kind: MemberKind::Method },
];

impl BridgeObject for ArtifactoryPath {
    fn class_name(&self) -> &'static str {
        "ArtifactoryPath"
    }

    fn summary(&self) -> String {
        self.uri()
    }

    fn members(&self) -> &'static [MemberSpec] {
        PATH_MEMBERS
    }

    fn call(&self, name: &str, args: CallArgs) -> Result<CallOutcome, BridgeError> {
        let value = match name {
            "exists" => {
                args.ensure_no_args(name)?;
                Value::Bool(self.exists()?)
            }
            "is_dir" => {
                args.ensure_no_args(name)?;
                Value::Bool(self.is_dir()?)
            }
            "is_file" => {
                args.ensure_no_args(name)?;
                Value::Bool(self.is_file()?)
            }
            "stat" => {
                args.ensure_no_args(name)?;
                Value::Object(Arc::new(self.stat()?))
            }
            "iterdir" => {
                args.ensure_no_args(name)?;
                let children = self.iterdir()?;
                Value::Lazy(Box::new(children.into_iter().map(Value::Path)))
            }
            "glob" => {
                let pattern = args.str_arg(0, "pattern", name)?;
                let matches = self.glob(pattern)?;
                Value::Lazy(Box::new(matches.into_iter().map(Value::Path)))
            }
            "joinpath" => {
                let segment = args.str_arg(0, "segment", name)?;
                Value::Path(self.joinpath(segment)?)
            }
            "read_bytes" => {
                args.ensure_no_args(name)?;
                Value::Bytes(self.read_bytes()?)
            }
            "read_text" => {
                let encoding = args.opt_str_arg(0, "encoding", name)?.unwrap_or("utf-8");
                let encoding = validate_encoding(encoding)?;
                Value::Str(self.read_text(&encoding)?)
            }
            "write_bytes" => {
                let written = self.write_bytes(args.bytes_arg(0, "data", name)?)?;
                Value::Int(written as i64)
            }
            "write_text" => {
                let content = args.str_arg(0, "content", name)?;
                let encoding = args.opt_str_arg(1, "encoding", name)?.unwrap_or("utf-8");
                let encoding = validate_encoding(encoding)?;
                Value::Int(self.write_text(content, &encoding)? as i64)
            }
            "mkdir" => {
                args.ensure_no_args(name)?;
                self.mkdir()?;
                Value::Null
            }
            "touch" => {
                args.ensure_no_args(name)?;
                self.touch()?;
                Value::Null
            }
            "unlink" => {
                args.ensure_no_args(name)?;
                self.unlink()?;
                Value::Null
            }
            "rmdir" => {
                args.ensure_no_args(name)?;
                self.rmdir()?;
                Value::Null
            }
            "copy_to" => {
                let target = args.path_arg(0, "target", name)?;
                Value::Path(self.copy_to(target)?)
            }
            "move_to" => {
                let target = args.path_arg(0, "target", name)?;
                Value::Path(self.move_to(target)?)
            }
            "download_stats" => {
                args.ensure_no_args(name)?;
                Value::from_json(&self.download_stats()?)
            }
            "repositories" => {
                args.ensure_no_args(name)?;
                Value::from_json(&self.repositories()?)
            }
            "ping" => {
                args.ensure_no_args(name)?;
                Value::Str(self.ping()?)
            }
            "version" => {
                args.ensure_no_args(name)?;
                Value::from_json(&self.version()?)
            }
            other => {
                return Err(BridgeError::not_found(format!(
                    "Method {:?} not found on target type ArtifactoryPath.",
                    other
                )));
            }
        };
        Ok(CallOutcome::Value(value))
    }
}

// ====== ARTIFACT STAT SURFACE ======

static STAT_MEMBERS: &[MemberSpec] = &[
    MemberSpec { name: "children", signature: "list[str] | none", kind: MemberKind::Field },
    MemberSpec { name: "created", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "created_by", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "is_dir", signature: "bool", kind: MemberKind::Field },
    MemberSpec { name: "last_modified", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "last_updated", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "md5", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "mime_type", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "modified_by", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "sha1", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "sha256", signature: "str | none", kind: MemberKind::Field },
    MemberSpec { name: "size", signature: "int | none", kind: MemberKind::Field },
];

impl BridgeObject for ArtifactStat {
    fn class_name(&self) -> &'static str {
        "ArtifactStat"
    }

    fn summary(&self) -> String {
        let size = self
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!("ArtifactStat(is_dir={}, size={})", self.is_dir, size)
    }

    fn members(&self) -> &'static [MemberSpec] {
        STAT_MEMBERS
    }

    fn call(&self, name: &str, _args: CallArgs) -> Result<CallOutcome, BridgeError> {
        Err(BridgeError::not_found(format!(
            "Method {:?} not found on target type ArtifactStat.",
            name
        )))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTarget;

    static FAKE_MEMBERS: &[MemberSpec] = &[
        MemberSpec { name: "boom", signature: "()", kind: MemberKind::Method },
        MemberSpec { name: "echo", signature: "(value)", kind: MemberKind::Method },
        MemberSpec { name: "fetch_async", signature: "()", kind: MemberKind::Method },
        MemberSpec { name: "get_repositories", signature: "()", kind: MemberKind::Method },
        MemberSpec { name: "many", signature: "()", kind: MemberKind::Method },
        MemberSpec { name: "non_callable", signature: "str", kind: MemberKind::Field },
    ];

    impl BridgeObject for FakeTarget {
        fn class_name(&self) -> &'static str {
            "FakeTarget"
        }
        fn summary(&self) -> String {
            "FakeTarget()".to_string()
        }
        fn members(&self) -> &'static [MemberSpec] {
            FAKE_MEMBERS
        }
        fn call(&self, name: &str, args: CallArgs) -> Result<CallOutcome, BridgeError> {
            match name {
                "get_repositories" => Ok(CallOutcome::Value(Value::List(vec![Value::Str(
                    "libs-release-local".to_string(),
                )]))),
                "echo" => Ok(CallOutcome::Value(
                    args.positional.into_iter().next().unwrap_or(Value::Null),
                )),
                "many" => Ok(CallOutcome::Value(Value::List(
                    (0..50).map(Value::Int).collect(),
                ))),
                "fetch_async" => Ok(CallOutcome::Deferred),
                "boom" => Err(BridgeError::Upstream(
                    "500 Server Error for url: https://host/artifactory/api/x".to_string(),
                )),
                other => Err(BridgeError::not_found(format!("no such method {:?}", other))),
            }
        }
    }

    fn invoke(
        method: &str,
        positional: Vec<Json>,
        max_items: Option<i64>,
    ) -> Result<GenericMethodResult, BridgeError> {
        let store = HandleStore::new();
        let settings = ServerSettings::default();
        invoke_method(
            &store,
            &settings,
            &FakeTarget,
            "dummy",
            method,
            &positional,
            &Map::new(),
            max_items,
        )
    }

    // === VALIDATION ORDER ===

    #[test]
    fn rejects_private_special_names_before_lookup() {
        for name in ["_internal", "__class__", "_echo"] {
            let err = invoke(name, vec![], Some(10)).unwrap_err();
            assert!(
                err.to_string().contains("private/special"),
                "{} should be rejected as private, got: {}",
                name,
                err
            );
        }
    }

    #[test]
    fn rejects_empty_method_name() {
        let err = invoke("   ", vec![], Some(10)).unwrap_err();
        assert!(err.to_string().contains("method cannot be empty"), "got: {}", err);
    }

    #[test]
    fn max_items_range_checked_first() {
        for bad in [0, -3, 10_001] {
            let err = invoke("get_repositories", vec![], Some(bad)).unwrap_err();
            assert!(
                err.to_string().contains("between 1 and 10000"),
                "max_items={} should fail range check, got: {}",
                bad,
                err
            );
        }
    }

    #[test]
    fn suggests_close_method_names() {
        let err = invoke("get_repo", vec![], Some(10)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Did you mean"), "missing suggestion: {}", msg);
        assert!(msg.contains("'get_repositories'"), "missing candidate: {}", msg);
    }

    #[test]
    fn no_suggestion_when_nothing_is_close() {
        let err = invoke("zzzzzzzz", vec![], Some(10)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("not found on target type FakeTarget"), "got: {}", msg);
        assert!(!msg.contains("Did you mean"), "unexpected suggestion: {}", msg);
    }

    #[test]
    fn rejects_non_callable_attribute() {
        let err = invoke("non_callable", vec![], Some(10)).unwrap_err();
        assert!(err.to_string().contains("not callable"), "got: {}", err);
    }

    #[test]
    fn rejects_deferred_results() {
        let err = invoke("fetch_async", vec![], Some(10)).unwrap_err();
        assert!(err.to_string().contains("deferred result"), "got: {}", err);
    }

    #[test]
    fn raised_errors_propagate_unwrapped() {
        let err = invoke("boom", vec![], Some(10)).unwrap_err();
        assert!(matches!(err, BridgeError::Upstream(_)), "got: {:?}", err);
    }

    // === SUCCESS PATH ===

    #[test]
    fn success_envelope_carries_label_method_and_type() {
        let result = invoke("get_repositories", vec![], Some(10)).unwrap();
        assert_eq!(result.target, "dummy");
        assert_eq!(result.method, "get_repositories");
        assert_eq!(result.result_type, "list");
        assert_eq!(result.result, json!(["libs-release-local"]));
    }

    #[test]
    fn method_name_is_trimmed() {
        let result = invoke("  get_repositories  ", vec![], Some(10)).unwrap();
        assert_eq!(result.method, "get_repositories");
    }

    #[test]
    fn arguments_decode_through_the_codec() {
        let result = invoke("echo", vec![json!({"__bytes_base64__": "aGk="})], Some(10)).unwrap();
        assert_eq!(result.result_type, "bytes");
        assert_eq!(result.result["size"], json!(2));
        assert_eq!(result.result["base64"], json!("aGk="));
    }

    #[test]
    fn oversized_results_truncate_through_the_engine() {
        let result = invoke("many", vec![], Some(3)).unwrap();
        assert_eq!(result.result["type"], "truncated_list");
        assert_eq!(result.result["total"], json!(50));
        assert_eq!(result.result["returned"], json!(3));
    }

    #[test]
    fn default_max_items_used_when_absent() {
        // FakeTarget::many returns 50 items; the default cap (200) keeps it whole.
        let result = invoke("many", vec![], None).unwrap();
        assert!(result.result.is_array(), "expected plain array, got {}", result.result);
    }

    // === CAPABILITIES ===

    #[test]
    fn capabilities_list_public_methods_sorted() {
        let caps = list_capabilities();
        assert_eq!(caps.path_method_count, caps.path_methods.len());

        let names: Vec<&str> = caps.path_methods.iter().map(|m| m.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted, "methods must be sorted by name");

        assert!(names.contains(&"stat"));
        assert!(names.contains(&"glob"));
        assert!(names.contains(&"write_text"));
        assert!(!names.contains(&"properties"), "fields are not callable methods");
    }

    #[test]
    fn capabilities_document_argument_encodings() {
        let caps = list_capabilities();
        assert!(caps.argument_encodings.get("handle_ref").is_some());
        assert!(caps.argument_encodings.get("path_ref").is_some());
        assert!(caps.argument_encodings.get("bytes").is_some());
        assert_eq!(caps.handle_workflow.len(), 3);
    }

    // === SIMILARITY ===

    #[test]
    fn similarity_orders_candidates() {
        assert!(similarity("get_repo", "get_repositories") >= 0.5);
        assert!(similarity("zzz", "get_repositories") < 0.5);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    // === STAT OBJECT ===

    #[test]
    fn stat_summary_reflects_insertion_time_values() {
        let stat = ArtifactStat {
            created: None,
            last_modified: None,
            last_updated: None,
            created_by: None,
            modified_by: None,
            mime_type: None,
            size: Some(42),
            sha1: None,
            sha256: None,
            md5: None,
            is_dir: false,
            children: None,
        };
        assert_eq!(stat.summary(), "ArtifactStat(is_dir=false, size=42)");
        assert!(stat.members().iter().all(|m| m.kind == MemberKind::Field));
    }
}
