//! Component B — Schema Loader.
//!
//! Resolves a root file's `include` closure into a `FileTree<Schema>`.
//! Grounded on the teacher's `search_path_manager.rs` (an ordered list of
//! search directories) and `workspace_layout.rs` (canonicalize, then
//! dedupe by canonical path) — generalized here from "discover every
//! schema file in a workspace" to "follow one root file's include graph".

use crate::error::LoaderError;
use crate::parser::parse_schema;
use crate::syntax::{FileTree, Schema};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads `root_path` and every file it transitively includes.
///
/// Include strings are resolved against, in order: the directory of the
/// importing file, then each of `include_dirs` in the order given. The
/// first existing candidate wins. A file already loaded (by canonical
/// path, including the root) is never parsed twice (spec §4.1).
pub fn load_file_tree(root_path: &Path, include_dirs: &[PathBuf]) -> Result<FileTree<Schema>, LoaderError> {
    let canonical_root = canonicalize(root_path)?;
    let root_schema = parse_file(&canonical_root)?;

    let mut loaded: HashSet<PathBuf> = HashSet::new();
    loaded.insert(canonical_root.clone());

    let mut tree = FileTree::new(canonical_root.clone(), root_schema);

    let mut stack: Vec<(PathBuf, Vec<String>)> = vec![(
        canonical_root.clone(),
        tree.root.includes().map(str::to_owned).collect(),
    )];

    while let Some((importing_file, includes)) = stack.pop() {
        let importing_dir = importing_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        // Depth-first, declared order: push in reverse so the first
        // include is processed next off the stack.
        for include in includes.into_iter().rev() {
            let resolved = resolve_include(&include, &importing_dir, include_dirs)?;
            let canonical = canonicalize(&resolved)?;

            if loaded.contains(&canonical) {
                debug!("include already loaded, skipping: {}", canonical.display());
                continue;
            }
            loaded.insert(canonical.clone());

            let schema = parse_file(&canonical)?;
            let nested_includes: Vec<String> = schema.includes().map(str::to_owned).collect();
            tree.files.insert(canonical.clone(), schema);
            stack.push((canonical, nested_includes));
        }
    }

    Ok(tree)
}

fn parse_file(path: &Path) -> Result<Schema, LoaderError> {
    let content = fs::read_to_string(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(parse_schema(&content, path)?)
}

fn canonicalize(path: &Path) -> Result<PathBuf, LoaderError> {
    fs::canonicalize(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn resolve_include(
    include: &str,
    importing_dir: &Path,
    include_dirs: &[PathBuf],
) -> Result<PathBuf, LoaderError> {
    let mut searched = Vec::with_capacity(1 + include_dirs.len());

    let local = importing_dir.join(include);
    searched.push(importing_dir.to_path_buf());
    if local.exists() {
        return Ok(local);
    }

    for dir in include_dirs {
        let candidate = dir.join(include);
        searched.push(dir.clone());
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(LoaderError::FileNotFound {
        path: include.to_string(),
        searched_dirs: searched,
    })
}
