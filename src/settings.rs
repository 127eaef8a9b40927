// Artifactory MCP Gateway - Configuration
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Environment-based settings plus the request-time validators for base
// URLs, repository names, relative paths, and text encodings. Auth is
// exclusive: token, API key, or username/password — never more than one.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::path::PathBuf;

use crate::errors::BridgeError;

const TRUE_VALUES: &[&str] = &["1", "true", "yes", "on"];
const FALSE_VALUES: &[&str] = &["0", "false", "no", "off"];

/// Encodings the text tools accept. Decode goes through reqwest's charset
/// machinery; upload re-encoding is limited to the UTF-8 family.
const KNOWN_ENCODINGS: &[&str] = &[
    "utf-8",
    "utf8",
    "ascii",
    "us-ascii",
    "latin-1",
    "latin1",
    "iso-8859-1",
    "windows-1252",
    "utf-16",
    "utf-16le",
    "utf-16be",
];

/// Process-wide server settings, loaded once from the environment.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub artifactory_base_url: Option<String>,
    pub artifactory_username: Option<String>,
    pub artifactory_password: Option<String>,
    pub artifactory_api_key: Option<String>,
    pub artifactory_token: Option<String>,
    pub artifactory_verify_ssl: bool,
    pub artifactory_timeout_seconds: u64,
    pub mcp_default_max_items: usize,
    pub mcp_worker_threads: usize,
    pub mcp_call_log: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            artifactory_base_url: None,
            artifactory_username: None,
            artifactory_password: None,
            artifactory_api_key: None,
            artifactory_token: None,
            artifactory_verify_ssl: true,
            artifactory_timeout_seconds: 30,
            mcp_default_max_items: 200,
            mcp_worker_threads: 8,
            mcp_call_log: None,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary lookup. Tests pass a map instead of
    /// touching the process environment.
    pub fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, BridgeError> {
        let base_url = match get("ARTIFACTORY_BASE_URL") {
            Some(value) if !value.trim().is_empty() => {
                Some(validate_base_url(&value, "ARTIFACTORY_BASE_URL")?)
            }
            _ => None,
        };

        let username = get("ARTIFACTORY_USERNAME").filter(|s| !s.is_empty());
        let password = get("ARTIFACTORY_PASSWORD").filter(|s| !s.is_empty());
        let api_key = get("ARTIFACTORY_API_KEY").filter(|s| !s.is_empty());
        let token = get("ARTIFACTORY_TOKEN").filter(|s| !s.is_empty());
        validate_auth_inputs(
            username.as_deref(),
            password.as_deref(),
            api_key.as_deref(),
            token.as_deref(),
        )?;

        let call_log = get("MCP_CALL_LOG")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            artifactory_base_url: base_url,
            artifactory_username: username,
            artifactory_password: password,
            artifactory_api_key: api_key,
            artifactory_token: token,
            artifactory_verify_ssl: parse_bool(
                get("ARTIFACTORY_VERIFY_SSL").as_deref(),
                true,
                "ARTIFACTORY_VERIFY_SSL",
            )?,
            artifactory_timeout_seconds: parse_int(
                get("ARTIFACTORY_TIMEOUT_SECONDS").as_deref(),
                30,
                1,
                600,
                "ARTIFACTORY_TIMEOUT_SECONDS",
            )? as u64,
            mcp_default_max_items: parse_int(
                get("MCP_DEFAULT_MAX_ITEMS").as_deref(),
                200,
                10,
                5000,
                "MCP_DEFAULT_MAX_ITEMS",
            )? as usize,
            mcp_worker_threads: parse_int(
                get("MCP_WORKER_THREADS").as_deref(),
                8,
                1,
                64,
                "MCP_WORKER_THREADS",
            )? as usize,
            mcp_call_log: call_log,
        })
    }
}

/// Parse a boolean env value. Accepts the usual word forms.
pub fn parse_bool(value: Option<&str>, default: bool, name: &str) -> Result<bool, BridgeError> {
    let raw = match value {
        None => return Ok(default),
        Some(v) => v,
    };
    let normalized = raw.trim().to_lowercase();
    if TRUE_VALUES.contains(&normalized.as_str()) {
        return Ok(true);
    }
    if FALSE_VALUES.contains(&normalized.as_str()) {
        return Ok(false);
    }
    Err(BridgeError::validation(format!(
        "Invalid boolean value for {}: {:?}. Use one of: true/false, 1/0, yes/no.",
        name, raw
    )))
}

/// Parse a bounded integer env value.
pub fn parse_int(
    value: Option<&str>,
    default: i64,
    minimum: i64,
    maximum: i64,
    name: &str,
) -> Result<i64, BridgeError> {
    let raw = match value {
        None => return Ok(default),
        Some(v) if v.trim().is_empty() => return Ok(default),
        Some(v) => v,
    };
    let parsed: i64 = raw.trim().parse().map_err(|_| {
        BridgeError::validation(format!("Invalid integer value for {}: {:?}.", name, raw))
    })?;
    if parsed < minimum || parsed > maximum {
        return Err(BridgeError::validation(format!(
            "Invalid value for {}: {}. Expected range is {}..{}.",
            name, parsed, minimum, maximum
        )));
    }
    Ok(parsed)
}

/// Validate and normalize an Artifactory base URL.
///
/// Host-only URLs get '/artifactory' appended — the REST API lives under
/// that context path on self-hosted instances, and a bare host is the
/// single most common misconfiguration.
pub fn validate_base_url(value: &str, name: &str) -> Result<String, BridgeError> {
    let candidate = value.trim().trim_end_matches('/').to_string();
    let rest = candidate
        .strip_prefix("https://")
        .or_else(|| candidate.strip_prefix("http://"))
        .ok_or_else(|| {
            BridgeError::validation(format!(
                "Invalid {}: {:?}. Expected an absolute HTTP/HTTPS URL.",
                name, value
            ))
        })?;
    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host, path),
        None => (rest, ""),
    };
    if host.is_empty() {
        return Err(BridgeError::validation(format!(
            "Invalid {}: {:?}. Expected an absolute HTTP/HTTPS URL.",
            name, value
        )));
    }
    if path.is_empty() {
        return Ok(format!("{}/artifactory", candidate));
    }
    Ok(candidate)
}

/// Validate a repository name: letters, digits, '.', '_', '-'.
pub fn validate_repository(repository: &str) -> Result<String, BridgeError> {
    let repo = repository.trim();
    if repo.is_empty() {
        return Err(BridgeError::validation("Repository cannot be empty."));
    }
    let ok = repo
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
    if !ok {
        return Err(BridgeError::validation(format!(
            "Invalid repository {:?}. Use letters, numbers, '.', '_' or '-'.",
            repository
        )));
    }
    Ok(repo.to_string())
}

/// Normalize a path inside a repository to forward slashes.
/// Empty / dot-only input collapses to the repository root; '..' is rejected.
pub fn validate_path(path: &str) -> Result<String, BridgeError> {
    let cleaned = path.trim().replace('\\', "/");
    if cleaned.is_empty() || cleaned == "." || cleaned == "/" {
        return Ok(String::new());
    }
    let parts: Vec<&str> = cleaned
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if parts.iter().any(|segment| *segment == "..") {
        return Err(BridgeError::validation("Path cannot contain '..' segments."));
    }
    Ok(parts.join("/"))
}

/// Validate a text encoding label against the supported set.
pub fn validate_encoding(encoding: &str) -> Result<String, BridgeError> {
    let candidate = encoding.trim().to_lowercase();
    if candidate.is_empty() {
        return Err(BridgeError::validation("encoding cannot be empty."));
    }
    if !KNOWN_ENCODINGS.contains(&candidate.as_str()) {
        return Err(BridgeError::validation(format!(
            "Unsupported encoding: {:?}.",
            encoding
        )));
    }
    Ok(candidate)
}

/// A pasted token that is only a JWT *header* segment decodes to a JSON
/// object with alg/kid/typ keys. Full access tokens never do.
fn looks_like_jwt_header_only(token: &str) -> bool {
    if token.contains('.') {
        return false;
    }
    let stripped = token.trim_end_matches('=');
    let decoded = match URL_SAFE_NO_PAD.decode(stripped) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let parsed: serde_json::Value = match serde_json::from_slice(&decoded) {
        Ok(v) => v,
        Err(_) => return false,
    };
    match parsed.as_object() {
        Some(obj) => ["alg", "kid", "typ"].iter().all(|key| obj.contains_key(*key)),
        None => false,
    }
}

fn validate_token_value(token: &str) -> Result<(), BridgeError> {
    let candidate = token.trim();
    if candidate.is_empty() {
        return Err(BridgeError::validation("ARTIFACTORY_TOKEN cannot be empty."));
    }
    if looks_like_jwt_header_only(candidate) {
        return Err(BridgeError::validation(
            "ARTIFACTORY_TOKEN appears to be only a JWT header segment, not a full access token. \
             Use the complete token string.",
        ));
    }
    Ok(())
}

fn validate_auth_inputs(
    username: Option<&str>,
    password: Option<&str>,
    api_key: Option<&str>,
    token: Option<&str>,
) -> Result<(), BridgeError> {
    if username.is_some() != password.is_some() {
        return Err(BridgeError::validation(
            "Set both ARTIFACTORY_USERNAME and ARTIFACTORY_PASSWORD, or neither.",
        ));
    }

    let auth_methods = usize::from(token.is_some())
        + usize::from(api_key.is_some())
        + usize::from(username.is_some() && password.is_some());
    if auth_methods > 1 {
        return Err(BridgeError::validation(
            "Configure only one authentication method: token, api key, or username/password.",
        ));
    }

    if let Some(token) = token {
        validate_token_value(token)?;
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<ServerSettings, BridgeError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerSettings::from_lookup(&move |name| map.get(name).cloned())
    }

    // === BASE URL ===

    #[test]
    fn base_url_appends_artifactory_for_host_only_urls() {
        assert_eq!(
            validate_base_url("https://artifactory.local", "base_url").unwrap(),
            "https://artifactory.local/artifactory"
        );
        assert_eq!(
            validate_base_url("https://artifactory.local/", "base_url").unwrap(),
            "https://artifactory.local/artifactory"
        );
    }

    #[test]
    fn base_url_keeps_existing_path() {
        assert_eq!(
            validate_base_url("https://artifactory.local/artifactory", "base_url").unwrap(),
            "https://artifactory.local/artifactory"
        );
        assert_eq!(
            validate_base_url("https://artifactory.local/custom-path", "base_url").unwrap(),
            "https://artifactory.local/custom-path"
        );
    }

    #[test]
    fn base_url_rejects_non_http_schemes() {
        assert!(validate_base_url("ftp://host/artifactory", "base_url").is_err());
        assert!(validate_base_url("host.example.com", "base_url").is_err());
        assert!(validate_base_url("https:///artifactory", "base_url").is_err());
    }

    // === REPOSITORY + PATH ===

    #[test]
    fn repository_pattern_enforced() {
        assert_eq!(validate_repository("libs-release-local").unwrap(), "libs-release-local");
        assert_eq!(validate_repository(" repo.1_x ").unwrap(), "repo.1_x");
        assert!(validate_repository("").is_err());
        assert!(validate_repository("bad/repo").is_err());
        assert!(validate_repository("bad repo").is_err());
    }

    #[test]
    fn path_normalizes_slashes_and_collapses_root() {
        assert_eq!(validate_path("com\\example\\app.jar").unwrap(), "com/example/app.jar");
        assert_eq!(validate_path("/com//example/./app.jar").unwrap(), "com/example/app.jar");
        assert_eq!(validate_path("").unwrap(), "");
        assert_eq!(validate_path(".").unwrap(), "");
        assert_eq!(validate_path("/").unwrap(), "");
    }

    #[test]
    fn path_rejects_traversal() {
        assert!(validate_path("../secrets").is_err());
        assert!(validate_path("com/../../etc").is_err());
    }

    // === ENCODING ===

    #[test]
    fn encoding_labels_validated() {
        assert_eq!(validate_encoding("UTF-8").unwrap(), "utf-8");
        assert_eq!(validate_encoding("latin-1").unwrap(), "latin-1");
        assert!(validate_encoding("").is_err());
        assert!(validate_encoding("klingon").is_err());
    }

    // === AUTH ===

    #[test]
    fn auth_methods_are_exclusive() {
        let err = settings_from(&[
            ("ARTIFACTORY_TOKEN", "full.token.value"),
            ("ARTIFACTORY_API_KEY", "AKCabc123"),
        ]);
        assert!(err.is_err(), "token + api key must be rejected");
    }

    #[test]
    fn username_requires_password() {
        assert!(settings_from(&[("ARTIFACTORY_USERNAME", "admin")]).is_err());
        assert!(settings_from(&[
            ("ARTIFACTORY_USERNAME", "admin"),
            ("ARTIFACTORY_PASSWORD", "s3cret"),
        ])
        .is_ok());
    }

    #[test]
    fn header_only_jwt_token_rejected() {
        // base64url of {"alg":"RS256","kid":"abc","typ":"JWT"}
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"abc","typ":"JWT"}"#);
        let err = settings_from(&[("ARTIFACTORY_TOKEN", header.as_str())]);
        assert!(err.is_err(), "header-only JWT segment must be rejected");

        let ok = settings_from(&[("ARTIFACTORY_TOKEN", "eyJ2ZXIiOiIyIn0.payload.sig")]);
        assert!(ok.is_ok(), "full dotted token must pass");
    }

    // === SCALARS ===

    #[test]
    fn bool_and_int_parsing() {
        assert!(!parse_bool(Some("off"), true, "X").unwrap());
        assert!(parse_bool(Some(" YES "), false, "X").unwrap());
        assert!(parse_bool(Some("maybe"), false, "X").is_err());

        assert_eq!(parse_int(Some("45"), 30, 1, 600, "X").unwrap(), 45);
        assert_eq!(parse_int(Some(""), 30, 1, 600, "X").unwrap(), 30);
        assert!(parse_int(Some("0"), 30, 1, 600, "X").is_err());
        assert!(parse_int(Some("nope"), 30, 1, 600, "X").is_err());
    }

    #[test]
    fn defaults_applied_when_env_empty() {
        let settings = settings_from(&[]).unwrap();
        assert!(settings.artifactory_base_url.is_none());
        assert!(settings.artifactory_verify_ssl);
        assert_eq!(settings.artifactory_timeout_seconds, 30);
        assert_eq!(settings.mcp_default_max_items, 200);
        assert_eq!(settings.mcp_worker_threads, 8);
    }

    #[test]
    fn base_url_env_is_normalized() {
        let settings = settings_from(&[("ARTIFACTORY_BASE_URL", "https://repo.example.com")]).unwrap();
        assert_eq!(
            settings.artifactory_base_url.as_deref(),
            Some("https://repo.example.com/artifactory")
        );
    }
}
