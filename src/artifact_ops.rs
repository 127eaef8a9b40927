// Artifactory MCP Gateway - Convenience Artifact Operations
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Fixed-shape operations for the common cases: list, stat, read text,
// write text. These sit directly on the REST client and bypass the
// generic bridge.

use serde_json::json;

use crate::client::{create_path, resolve_base_url, wildcard_match};
use crate::errors::BridgeError;
use crate::handles::HandleStore;
use crate::models::{
    ArtifactDetailsResult, ArtifactEntry, ListArtifactsResult, ReadArtifactTextResult,
    WriteArtifactTextResult,
};
use crate::settings::{validate_encoding, validate_path, validate_repository, ServerSettings};
use crate::value::{encode, Value};

const MAX_TEXT_PAYLOAD: usize = 5_000_000;

/// Path of a child relative to the listing root.
fn relative_to(root_in_repo: &str, child_in_repo: &str) -> String {
    if root_in_repo.is_empty() {
        return child_in_repo.to_string();
    }
    child_in_repo
        .strip_prefix(root_in_repo)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .unwrap_or_else(|| child_in_repo.to_string())
}

/// List artifacts under a repository path with optional filtering and
/// recursion.
#[allow(clippy::too_many_arguments)]
pub fn list_artifacts(
    settings: &ServerSettings,
    repository: &str,
    path: &str,
    recursive: bool,
    pattern: &str,
    include_directories: bool,
    include_stats: bool,
    max_items: i64,
    base_url: Option<&str>,
) -> Result<ListArtifactsResult, BridgeError> {
    if !(1..=1000).contains(&max_items) {
        return Err(BridgeError::validation("max_items must be between 1 and 1000."));
    }
    if pattern.trim().is_empty() {
        return Err(BridgeError::validation("pattern cannot be empty."));
    }
    let max_items = max_items as usize;

    let resolved_base_url = resolve_base_url(base_url, settings)?;
    let root = create_path(&resolved_base_url, repository, path, settings)?;

    if !root.exists()? {
        return Err(BridgeError::not_found(format!("Path does not exist: {}", root.uri())));
    }
    if !root.is_dir()? {
        return Err(BridgeError::validation(format!("Path is not a directory: {}", root.uri())));
    }

    let root_in_repo = root.path_in_repo().to_string();
    let children = if recursive {
        let recursive_pattern = if pattern == "*" { "**/*" } else { pattern };
        root.glob(recursive_pattern)?
    } else {
        let mut children = root.iterdir()?;
        if pattern != "*" {
            children.retain(|child| wildcard_match(pattern, child.name()));
        }
        children
    };

    let mut items: Vec<ArtifactEntry> = Vec::new();
    let mut truncated = false;
    for child in children {
        if items.len() >= max_items {
            truncated = true;
            break;
        }

        let stat = child.stat()?;
        if stat.is_dir && !include_directories {
            continue;
        }

        let (size, last_modified) = if include_stats {
            let size = if stat.is_dir { None } else { Some(stat.size.unwrap_or(0)) };
            (size, stat.last_modified.clone())
        } else {
            (None, None)
        };

        items.push(ArtifactEntry {
            uri: child.uri(),
            name: child.name().to_string(),
            path: relative_to(&root_in_repo, child.path_in_repo()),
            is_dir: stat.is_dir,
            size,
            last_modified,
        });
    }

    Ok(ListArtifactsResult {
        base_url: resolved_base_url,
        repository: validate_repository(repository)?,
        path: validate_path(path)?,
        count: items.len(),
        truncated,
        items,
    })
}

/// Fetch metadata for an artifact or folder, with optional properties
/// and download stats. Both pass through the value codec so long
/// property lists truncate at the configured cap.
pub fn get_artifact_details(
    settings: &ServerSettings,
    store: &HandleStore,
    repository: &str,
    path: &str,
    include_properties: bool,
    include_download_stats: bool,
    base_url: Option<&str>,
) -> Result<ArtifactDetailsResult, BridgeError> {
    let resolved_base_url = resolve_base_url(base_url, settings)?;
    let target = create_path(&resolved_base_url, repository, path, settings)?;

    let stat = match target.stat() {
        Ok(stat) => stat,
        Err(BridgeError::NotFound(_)) => {
            return Err(BridgeError::not_found(format!("Artifact not found: {}", target.uri())));
        }
        Err(err) => return Err(err),
    };

    let max_items = settings.mcp_default_max_items;
    let download_stats = if include_download_stats && !stat.is_dir {
        let raw = target.download_stats()?;
        Some(encode(Value::from_json(&raw), max_items, true, store))
    } else {
        None
    };

    let properties = if include_properties {
        let raw = target.properties()?;
        encode(Value::from_json(&raw), max_items, true, store)
    } else {
        json!({})
    };

    Ok(ArtifactDetailsResult {
        base_url: resolved_base_url,
        repository: validate_repository(repository)?,
        path: validate_path(path)?,
        uri: target.uri(),
        is_dir: stat.is_dir,
        stat,
        properties,
        download_stats,
    })
}

/// Read a text artifact when its size is below max_bytes.
pub fn read_artifact_text(
    settings: &ServerSettings,
    repository: &str,
    path: &str,
    encoding: &str,
    max_bytes: i64,
    base_url: Option<&str>,
) -> Result<ReadArtifactTextResult, BridgeError> {
    if !(1..=MAX_TEXT_PAYLOAD as i64).contains(&max_bytes) {
        return Err(BridgeError::validation("max_bytes must be between 1 and 5000000."));
    }
    let normalized_encoding = validate_encoding(encoding)?;

    let resolved_base_url = resolve_base_url(base_url, settings)?;
    let clean_path = validate_path(path)?;
    if clean_path.is_empty() {
        return Err(BridgeError::validation("path must reference a file in the repository."));
    }

    let target = create_path(&resolved_base_url, repository, &clean_path, settings)?;
    let stat = match target.stat() {
        Ok(stat) => stat,
        Err(BridgeError::NotFound(_)) => {
            return Err(BridgeError::not_found(format!("Artifact not found: {}", target.uri())));
        }
        Err(err) => return Err(err),
    };
    if stat.is_dir {
        return Err(BridgeError::validation(format!("Artifact is a directory: {}", target.uri())));
    }

    let size = stat.size.unwrap_or(0);
    if size > max_bytes {
        return Err(BridgeError::validation(format!(
            "Artifact size {} exceeds max_bytes {}. Increase max_bytes to continue.",
            size, max_bytes
        )));
    }

    let content = target.read_text(&normalized_encoding)?;
    Ok(ReadArtifactTextResult {
        base_url: resolved_base_url,
        repository: validate_repository(repository)?,
        path: clean_path,
        uri: target.uri(),
        encoding: normalized_encoding,
        size,
        content,
    })
}

/// Upload text content as an artifact, with optional parent folder
/// creation and overwrite protection.
#[allow(clippy::too_many_arguments)]
pub fn write_artifact_text(
    settings: &ServerSettings,
    repository: &str,
    path: &str,
    content: &str,
    encoding: &str,
    overwrite: bool,
    create_parents: bool,
    base_url: Option<&str>,
) -> Result<WriteArtifactTextResult, BridgeError> {
    let normalized_encoding = validate_encoding(encoding)?;
    if content.len() > MAX_TEXT_PAYLOAD {
        return Err(BridgeError::validation(
            "content is too large. Maximum supported payload is 5 MB.",
        ));
    }

    let resolved_base_url = resolve_base_url(base_url, settings)?;
    let clean_path = validate_path(path)?;
    if clean_path.is_empty() {
        return Err(BridgeError::validation("path must reference a file in the repository."));
    }

    let target = create_path(&resolved_base_url, repository, &clean_path, settings)?;
    let exists_before = target.exists()?;
    if exists_before && !overwrite {
        return Err(BridgeError::Conflict(format!(
            "Artifact already exists at {}. Set overwrite=true to replace it.",
            target.uri()
        )));
    }

    if create_parents {
        let parent = target.parent();
        if !parent.path_in_repo().is_empty() && !parent.exists()? {
            parent.mkdir()?;
        }
    }

    let bytes_written = target.write_text(content, &normalized_encoding)?;
    Ok(WriteArtifactTextResult {
        base_url: resolved_base_url,
        repository: validate_repository(repository)?,
        path: clean_path,
        uri: target.uri(),
        bytes_written,
        overwritten: exists_before,
    })
}

// ============================================================================
// TESTS
// ============================================================================
