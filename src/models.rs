// Artifactory MCP Gateway - Tool Result Models
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every tool returns one of these shapes, rendered as pretty JSON text.

use serde::Serialize;
use serde_json::Value as Json;

/// One child entry from list_artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactEntry {
    pub uri: String,
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: Option<i64>,
    pub last_modified: Option<String>,
}

/// Normalized storage-API stat for an artifact or folder.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStat {
    pub created: Option<String>,
    pub last_modified: Option<String>,
    pub last_updated: Option<String>,
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub md5: Option<String>,
    pub is_dir: bool,
    pub children: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListArtifactsResult {
    pub base_url: String,
    pub repository: String,
    pub path: String,
    pub count: usize,
    pub truncated: bool,
    pub items: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactDetailsResult {
    pub base_url: String,
    pub repository: String,
    pub path: String,
    pub uri: String,
    pub is_dir: bool,
    pub stat: ArtifactStat,
    pub properties: Json,
    pub download_stats: Option<Json>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadArtifactTextResult {
    pub base_url: String,
    pub repository: String,
    pub path: String,
    pub uri: String,
    pub encoding: String,
    pub size: i64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteArtifactTextResult {
    pub base_url: String,
    pub repository: String,
    pub path: String,
    pub uri: String,
    pub bytes_written: usize,
    pub overwritten: bool,
}

/// One live handle, as reported by list_artifactory_handles.
#[derive(Debug, Clone, Serialize)]
pub struct HandleInfo {
    pub handle_id: String,
    pub class_name: String,
    pub summary: String,
}

/// Idempotent-delete result: dropped is always true — the desired
/// post-state ("handle absent") is always achieved.
#[derive(Debug, Clone, Serialize)]
pub struct DropHandleResult {
    pub handle_id: String,
    pub dropped: bool,
    pub existed: bool,
    pub remaining_handles: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilitiesResult {
    pub package: String,
    pub package_version: String,
    pub path_method_count: usize,
    pub path_methods: Vec<MethodDescriptor>,
    pub handle_workflow: Vec<String>,
    pub argument_encodings: Json,
}

/// Envelope for generic method invocation results.
#[derive(Debug, Clone, Serialize)]
pub struct GenericMethodResult {
    pub target: String,
    pub method: String,
    pub result_type: String,
    pub result: Json,
}
