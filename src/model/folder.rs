use serde::{Deserialize, Serialize};

/// Kind of entry in a ticket folder tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of a ticket folder, mirroring the on-disk tree.
///
/// `children` is present only for directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FolderNode>>,
}

impl FolderNode {
    pub fn file(name: impl Into<String>) -> Self {
        FolderNode {
            name: name.into(),
            kind: NodeKind::File,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<FolderNode>) -> Self {
        FolderNode {
            name: name.into(),
            kind: NodeKind::Directory,
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_like_the_folder_tree_contract() {
        let tree = FolderNode::directory("notes", vec![FolderNode::file("a.txt")]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "directory");
        assert_eq!(json["children"][0]["name"], "a.txt");
        assert_eq!(json["children"][0]["type"], "file");
        assert!(json["children"][0].get("children").is_none());
    }
}
