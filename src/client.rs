// Artifactory MCP Gateway - Artifactory REST Client
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Blocking HTTP client over the Artifactory REST API. A path object is
// a location inside the remote repository (base URL + repository +
// relative path); the root object (empty repository) carries the
// admin/query surface. All network failures surface as Upstream errors
// with a requests-style status line plus a response body snippet.

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{json, Value as Json};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

use crate::errors::BridgeError;
use crate::models::ArtifactStat;
use crate::settings::{validate_path, validate_repository, ServerSettings};

const USER_AGENT: &str = concat!("artifactory-mcp/", env!("CARGO_PKG_VERSION"));

/// Upload re-encoding is limited to byte-transparent labels; everything
/// else would need a transcoding table the deploy path does not carry.
const UPLOAD_ENCODINGS: &[&str] = &["utf-8", "utf8", "ascii", "us-ascii"];

/// Authentication method, exactly one (or none) per settings validation.
#[derive(Debug, Clone)]
pub enum Auth {
    Anonymous,
    Token(String),
    ApiKey(String),
    Basic { username: String, password: String },
}

impl Auth {
    pub fn from_settings(settings: &ServerSettings) -> Auth {
        if let Some(token) = &settings.artifactory_token {
            return Auth::Token(token.clone());
        }
        if let Some(key) = &settings.artifactory_api_key {
            return Auth::ApiKey(key.clone());
        }
        if let (Some(username), Some(password)) = (
            &settings.artifactory_username,
            &settings.artifactory_password,
        ) {
            return Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            };
        }
        Auth::Anonymous
    }

    fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Anonymous => req,
            Auth::Token(token) => req.bearer_auth(token),
            Auth::ApiKey(key) => req.header("X-JFrog-Art-Api", key.clone()),
            Auth::Basic { username, password } => req.basic_auth(username, Some(password.clone())),
        }
    }
}

/// A location inside the remote Artifactory instance.
///
/// Cloning is cheap: the underlying HTTP client is shared.
#[derive(Clone)]
pub struct ArtifactoryPath {
    base_url: String,
    repository: String,
    path: String,
    auth: Auth,
    client: Client,
}

impl fmt::Display for ArtifactoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl fmt::Debug for ArtifactoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactoryPath({})", self.uri())
    }
}

/// Resolve the effective base URL: explicit argument wins, then the
/// configured default; neither present is an error.
pub fn resolve_base_url(
    base_url: Option<&str>,
    settings: &ServerSettings,
) -> Result<String, BridgeError> {
    if let Some(value) = base_url {
        if !value.trim().is_empty() {
            return crate::settings::validate_base_url(value, "base_url");
        }
    }
    if let Some(configured) = &settings.artifactory_base_url {
        return Ok(configured.clone());
    }
    Err(BridgeError::validation(
        "Missing Artifactory base URL. Set ARTIFACTORY_BASE_URL or pass base_url in the tool call.",
    ))
}

/// Root-scoped path object: admin and query-level operations.
pub fn create_root(base_url: &str, settings: &ServerSettings) -> Result<ArtifactoryPath, BridgeError> {
    ArtifactoryPath::new(base_url, "", "", settings)
}

/// Path-scoped object: artifact-level operations under one repository.
pub fn create_path(
    base_url: &str,
    repository: &str,
    path: &str,
    settings: &ServerSettings,
) -> Result<ArtifactoryPath, BridgeError> {
    let repo = validate_repository(repository)?;
    let relative = validate_path(path)?;
    ArtifactoryPath::new(base_url, &repo, &relative, settings)
}

impl ArtifactoryPath {
    fn new(
        base_url: &str,
        repository: &str,
        path: &str,
        settings: &ServerSettings,
    ) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.artifactory_timeout_seconds))
            .danger_accept_invalid_certs(!settings.artifactory_verify_ssl)
            .build()
            .map_err(|e| BridgeError::internal("http client", e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            path: path.to_string(),
            auth: Auth::from_settings(settings),
            client,
        })
    }

    fn derived(&self, repository: &str, path: &str) -> ArtifactoryPath {
        ArtifactoryPath {
            base_url: self.base_url.clone(),
            repository: repository.to_string(),
            path: path.to_string(),
            auth: self.auth.clone(),
            client: self.client.clone(),
        }
    }

    // ====== LOCATION ======

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Relative path inside the repository, "" for the repository root.
    pub fn path_in_repo(&self) -> &str {
        &self.path
    }

    /// Full content URI for this location.
    pub fn uri(&self) -> String {
        let mut uri = self.base_url.clone();
        if !self.repository.is_empty() {
            uri.push('/');
            uri.push_str(&self.repository);
        }
        if !self.path.is_empty() {
            uri.push('/');
            uri.push_str(&self.path);
        }
        uri
    }

    /// Storage-API URI for this location.
    fn storage_uri(&self) -> String {
        let mut uri = format!("{}/api/storage/{}", self.base_url, self.repository);
        if !self.path.is_empty() {
            uri.push('/');
            uri.push_str(&self.path);
        }
        uri
    }

    /// Final path segment; the repository name at a repository root.
    pub fn name(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, last)) => last,
            None if !self.path.is_empty() => &self.path,
            None => &self.repository,
        }
    }

    /// Containing location. The parent of a repository root is the
    /// instance root; the root is its own parent.
    pub fn parent(&self) -> ArtifactoryPath {
        if let Some((front, _)) = self.path.rsplit_once('/') {
            return self.derived(&self.repository, front);
        }
        if !self.path.is_empty() {
            return self.derived(&self.repository, "");
        }
        self.derived("", "")
    }

    /// Append one or more path segments.
    pub fn joinpath(&self, segment: &str) -> Result<ArtifactoryPath, BridgeError> {
        let tail = validate_path(segment)?;
        if tail.is_empty() {
            return Ok(self.clone());
        }
        let joined = if self.path.is_empty() {
            tail
        } else {
            format!("{}/{}", self.path, tail)
        };
        Ok(self.derived(&self.repository, &joined))
    }

    // ====== HTTP PLUMBING ======

    fn request(&self, method: reqwest::Method, url: &str) -> RequestBuilder {
        log::debug!("{} {}", method, url);
        self.auth.apply(self.client.request(method, url))
    }

    fn get_json(&self, url: &str) -> Result<Json, BridgeError> {
        let resp = self.request(reqwest::Method::GET, url).send()?;
        let resp = check(resp)?;
        Ok(resp.json()?)
    }

    // ====== FILESYSTEM SURFACE ======

    pub fn exists(&self) -> Result<bool, BridgeError> {
        let resp = self.request(reqwest::Method::GET, &self.storage_uri()).send()?;
        if resp.status().as_u16() == 404 {
            return Ok(false);
        }
        check(resp)?;
        Ok(true)
    }

    pub fn stat(&self) -> Result<ArtifactStat, BridgeError> {
        let resp = self.request(reqwest::Method::GET, &self.storage_uri()).send()?;
        if resp.status().as_u16() == 404 {
            return Err(BridgeError::not_found(format!("Artifact not found: {}", self.uri())));
        }
        let resp = check(resp)?;
        let raw: Json = resp.json()?;
        Ok(parse_stat(&raw))
    }

    pub fn is_dir(&self) -> Result<bool, BridgeError> {
        match self.stat() {
            Ok(stat) => Ok(stat.is_dir),
            Err(BridgeError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn is_file(&self) -> Result<bool, BridgeError> {
        match self.stat() {
            Ok(stat) => Ok(!stat.is_dir),
            Err(BridgeError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Direct children of a folder.
    pub fn iterdir(&self) -> Result<Vec<ArtifactoryPath>, BridgeError> {
        let stat = self.stat()?;
        if !stat.is_dir {
            return Err(BridgeError::validation(format!("Not a directory: {}", self.uri())));
        }
        let children = stat.children.unwrap_or_default();
        children.iter().map(|name| self.joinpath(name)).collect()
    }

    /// All descendants matching a wildcard pattern ('*', '?', '**').
    /// Uses the deep-listing API, one round trip regardless of depth.
    pub fn glob(&self, pattern: &str) -> Result<Vec<ArtifactoryPath>, BridgeError> {
        if pattern.trim().is_empty() {
            return Err(BridgeError::validation("pattern cannot be empty."));
        }
        let url = format!(
            "{}?list&deep=1&listFolders=1&includeRootPath=0",
            self.storage_uri()
        );
        let listing = self.get_json(&url)?;
        let mut matches = Vec::new();
        if let Some(files) = listing.get("files").and_then(|f| f.as_array()) {
            for entry in files {
                let rel = entry
                    .get("uri")
                    .and_then(|u| u.as_str())
                    .unwrap_or("")
                    .trim_start_matches('/');
                if rel.is_empty() {
                    continue;
                }
                if wildcard_match(pattern, rel) {
                    matches.push(self.joinpath(rel)?);
                }
            }
        }
        Ok(matches)
    }

    // ====== CONTENT ======

    pub fn read_bytes(&self) -> Result<Vec<u8>, BridgeError> {
        let resp = self.request(reqwest::Method::GET, &self.uri()).send()?;
        let resp = check(resp)?;
        Ok(resp.bytes()?.to_vec())
    }

    /// Read content as text. The charset label is used when the server
    /// does not declare one on the response.
    pub fn read_text(&self, encoding: &str) -> Result<String, BridgeError> {
        let resp = self.request(reqwest::Method::GET, &self.uri()).send()?;
        let resp = check(resp)?;
        Ok(resp.text_with_charset(encoding)?)
    }

    /// Deploy raw bytes, with a sha256 checksum header so the server can
    /// verify the payload on arrival.
    pub fn write_bytes(&self, data: &[u8]) -> Result<usize, BridgeError> {
        let digest = hex::encode(Sha256::digest(data));
        let resp = self
            .request(reqwest::Method::PUT, &self.uri())
            .header("X-Checksum-Sha256", digest)
            .body(data.to_vec())
            .send()?;
        check(resp)?;
        Ok(data.len())
    }

    pub fn write_text(&self, content: &str, encoding: &str) -> Result<usize, BridgeError> {
        let label = encoding.trim().to_lowercase();
        if !UPLOAD_ENCODINGS.contains(&label.as_str()) {
            return Err(BridgeError::validation(format!(
                "Unsupported encoding for upload: {:?}. Use utf-8 or ascii.",
                encoding
            )));
        }
        if (label == "ascii" || label == "us-ascii") && !content.is_ascii() {
            return Err(BridgeError::validation(
                "content contains non-ASCII characters but encoding is ascii.",
            ));
        }
        self.write_bytes(content.as_bytes())
    }

    /// Create this folder (and any missing parents — the server creates
    /// the whole chain on a trailing-slash deploy).
    pub fn mkdir(&self) -> Result<(), BridgeError> {
        let url = format!("{}/", self.uri());
        let resp = self.request(reqwest::Method::PUT, &url).send()?;
        check(resp)?;
        Ok(())
    }

    /// Create an empty file at this location.
    pub fn touch(&self) -> Result<(), BridgeError> {
        self.write_bytes(&[])?;
        Ok(())
    }

    pub fn unlink(&self) -> Result<(), BridgeError> {
        let stat = self.stat()?;
        if stat.is_dir {
            return Err(BridgeError::validation(format!(
                "Is a directory (use rmdir): {}",
                self.uri()
            )));
        }
        self.delete()
    }

    pub fn rmdir(&self) -> Result<(), BridgeError> {
        let stat = self.stat()?;
        if !stat.is_dir {
            return Err(BridgeError::validation(format!("Not a directory: {}", self.uri())));
        }
        self.delete()
    }

    fn delete(&self) -> Result<(), BridgeError> {
        let resp = self.request(reqwest::Method::DELETE, &self.uri()).send()?;
        check(resp)?;
        Ok(())
    }

    pub fn copy_to(&self, target: &ArtifactoryPath) -> Result<ArtifactoryPath, BridgeError> {
        self.copy_or_move("copy", target)
    }

    pub fn move_to(&self, target: &ArtifactoryPath) -> Result<ArtifactoryPath, BridgeError> {
        self.copy_or_move("move", target)
    }

    fn copy_or_move(
        &self,
        verb: &str,
        target: &ArtifactoryPath,
    ) -> Result<ArtifactoryPath, BridgeError> {
        if self.repository.is_empty() || target.repository.is_empty() {
            return Err(BridgeError::validation(format!(
                "{} requires repository-scoped source and target paths.",
                verb
            )));
        }
        let url = format!(
            "{}/api/{}/{}/{}?to=/{}/{}",
            self.base_url, verb, self.repository, self.path, target.repository, target.path
        );
        let resp = self.request(reqwest::Method::POST, &url).send()?;
        check(resp)?;
        Ok(target.clone())
    }

    // ====== METADATA ======

    /// Item properties as a JSON object of key → value list.
    /// The server answers 404 when no properties are set; that is an
    /// empty property set, not a missing artifact.
    pub fn properties(&self) -> Result<Json, BridgeError> {
        let url = format!("{}?properties", self.storage_uri());
        let resp = self.request(reqwest::Method::GET, &url).send()?;
        if resp.status().as_u16() == 404 {
            let body = resp.text().unwrap_or_default();
            if body.contains("No properties") {
                return Ok(json!({}));
            }
            return Err(BridgeError::Upstream(format!(
                "404 Client Error for url: {}: {}",
                url,
                snippet(&body)
            )));
        }
        let resp = check(resp)?;
        let raw: Json = resp.json()?;
        Ok(raw.get("properties").cloned().unwrap_or_else(|| json!({})))
    }

    pub fn download_stats(&self) -> Result<Json, BridgeError> {
        let url = format!("{}?stats", self.storage_uri());
        self.get_json(&url)
    }

    // ====== INSTANCE SURFACE ======

    pub fn repositories(&self) -> Result<Json, BridgeError> {
        let url = format!("{}/api/repositories", self.base_url);
        self.get_json(&url)
    }

    pub fn ping(&self) -> Result<String, BridgeError> {
        let url = format!("{}/api/system/ping", self.base_url);
        let resp = self.request(reqwest::Method::GET, &url).send()?;
        let resp = check(resp)?;
        Ok(resp.text()?.trim().to_string())
    }

    pub fn version(&self) -> Result<Json, BridgeError> {
        let url = format!("{}/api/system/version", self.base_url);
        self.get_json(&url)
    }
}

/// Map a non-success response to an Upstream error with a requests-style
/// status line and a body snippet.
fn check(resp: Response) -> Result<Response, BridgeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let class = if status.is_client_error() { "Client" } else { "Server" };
    let body = resp.text().unwrap_or_default();
    let mut message = format!("{} {} Error for url: {}", status.as_u16(), class, url);
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        message.push_str(": ");
        message.push_str(&snippet(trimmed));
    }
    Err(BridgeError::Upstream(message))
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

/// Normalize a storage-API response into an ArtifactStat. Folder entries
/// carry a children array; file entries carry size (as a string) and
/// checksums.
pub(crate) fn parse_stat(raw: &Json) -> ArtifactStat {
    let children = raw.get("children").and_then(|c| c.as_array()).map(|entries| {
        entries
            .iter()
            .filter_map(|entry| entry.get("uri").and_then(|u| u.as_str()))
            .map(|uri| uri.trim_start_matches('/').to_string())
            .collect::<Vec<String>>()
    });
    let is_dir = children.is_some();

    let checksums = raw.get("checksums");
    let checksum = |name: &str| {
        checksums
            .and_then(|c| c.get(name))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    let size = match raw.get("size") {
        Some(Json::String(s)) => s.parse::<i64>().ok(),
        Some(Json::Number(n)) => n.as_i64(),
        _ => None,
    };

    let text_field = |name: &str| {
        raw.get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    ArtifactStat {
        created: text_field("created"),
        last_modified: text_field("lastModified"),
        last_updated: text_field("lastUpdated"),
        created_by: text_field("createdBy"),
        modified_by: text_field("modifiedBy"),
        mime_type: text_field("mimeType"),
        size,
        sha1: checksum("sha1"),
        sha256: checksum("sha256"),
        md5: checksum("md5"),
        is_dir,
        children,
    }
}

/// Glob-style match: '*' and '?' within a path segment, '**' spans
/// segments. Used for listing filters and recursive search.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    fn segment_match(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                segment_match(&p[1..], t) || (!t.is_empty() && segment_match(p, &t[1..]))
            }
            (Some(b'?'), Some(_)) => segment_match(&p[1..], &t[1..]),
            (Some(a), Some(b)) if a == b => segment_match(&p[1..], &t[1..]),
            _ => false,
        }
    }
    fn segments_match(ps: &[&str], ts: &[&str]) -> bool {
        match ps.first() {
            None => ts.is_empty(),
            Some(&"**") => {
                segments_match(&ps[1..], ts) || (!ts.is_empty() && segments_match(ps, &ts[1..]))
            }
            Some(p) => {
                !ts.is_empty()
                    && segment_match(p.as_bytes(), ts[0].as_bytes())
                    && segments_match(&ps[1..], &ts[1..])
            }
        }
    }
    let ps: Vec<&str> = pattern.split('/').collect();
    let ts: Vec<&str> = text.split('/').collect();
    segments_match(&ps, &ts)
}

// ============================================================================
// TESTS
// ============================================================================
