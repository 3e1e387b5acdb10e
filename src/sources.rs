// sources.rs

use crate::error::{AggregationError, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// One input table and the name its row carries in charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub name: String,
}

/// All files that share one display name, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub name: String,
    pub paths: Vec<PathBuf>,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map_or(false, |name| name.to_string_lossy().starts_with('.'))
}

/// Resolves the input location: a `.json` file mapping paths to common names,
/// or a directory whose regular, non-hidden files are used under their file names.
pub fn discover_sources(path: &Path) -> Result<Vec<SourceFile>> {
    let io_err = |source| AggregationError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.extension().map_or(false, |ext| ext == "json") {
        info!("Reading path-to-name map: {}", path.display());
        let content = fs::read_to_string(path).map_err(io_err)?;
        let map: serde_json::Map<String, Value> =
            serde_json::from_str(&content).map_err(|source| AggregationError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let mut sources = Vec::with_capacity(map.len());
        for (file_path, name) in map {
            let name = match name {
                Value::String(s) => s,
                other => {
                    warn!(
                        "Non-string name {} for {} in {}; using it verbatim.",
                        other,
                        file_path,
                        path.display()
                    );
                    other.to_string()
                }
            };
            let file_path = PathBuf::from(file_path);
            if is_hidden(&file_path) {
                debug!("Skipping hidden file {}", file_path.display());
                continue;
            }
            sources.push(SourceFile { path: file_path, name });
        }
        return Ok(sources);
    }

    info!("Discovering tables in directory: {}", path.display());
    let mut paths: Vec<PathBuf> = fs::read_dir(path)
        .map_err(io_err)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && !is_hidden(p))
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            SourceFile { path: p, name }
        })
        .collect())
}

/// Merges files sharing a name into one logical source, ordered by first appearance.
pub fn group_by_name(sources: Vec<SourceFile>) -> Vec<SourceGroup> {
    let mut groups: Vec<SourceGroup> = Vec::new();
    for source in sources {
        match groups.iter_mut().find(|g| g.name == source.name) {
            Some(group) => {
                debug!(
                    "{} joins '{}' ({} file(s) so far)",
                    source.path.display(),
                    group.name,
                    group.paths.len()
                );
                group.paths.push(source.path);
            }
            None => groups.push(SourceGroup {
                name: source.name,
                paths: vec![source.path],
            }),
        }
    }
    groups
}
