use std::fs;
use std::path::Path;

use tracing::warn;

use crate::model::folder::FolderNode;

/// Name of the per-ticket metadata file, hidden from folder trees.
pub const METADATA_FILE: &str = "ticket.json";

/// Build the tree of user files inside a ticket folder.
///
/// Returns `None` when `dir` does not exist (or is not a directory). The
/// metadata file is never included. A directory that cannot be read shows
/// up with an empty child list instead of failing the whole tree. Entries
/// are sorted by name; symlinks are reported as files and never followed.
pub fn inspect(dir: &Path) -> Option<Vec<FolderNode>> {
    if !dir.is_dir() {
        return None;
    }
    Some(read_level(dir))
}

fn read_level(dir: &Path) -> Vec<FolderNode> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "could not read directory");
            return Vec::new();
        }
    };

    let mut nodes = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "could not read directory entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == METADATA_FILE {
            continue;
        }

        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir {
            nodes.push(FolderNode::directory(name, read_level(&entry.path())));
        } else {
            nodes.push(FolderNode::file(name));
        }
    }

    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    nodes
}

/// Count the files (not directories) in a tree.
pub fn count_files(nodes: &[FolderNode]) -> usize {
    nodes
        .iter()
        .map(|n| match &n.children {
            Some(children) => count_files(children),
            None => 1,
        })
        .sum()
}
