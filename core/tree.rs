use crate::error::{AppError, Result};
use log;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(name: &str, node_type: NodeType) -> Self {
        Self {
            name: name.to_string(),
            node_type,
            children: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }
}

/// Builds a directory tree from `/`-separated relative file paths.
///
/// Siblings are ordered directories first, then files, each group by name.
pub fn build_tree<S: AsRef<str>>(relative_files: &[S]) -> Result<Vec<TreeNode>> {
    log::debug!("Building tree structure from {} paths...", relative_files.len());
    let mut root_nodes: Vec<TreeNode> = Vec::new();

    for rel_path in relative_files {
        let rel_path = rel_path.as_ref();
        let components: Vec<&str> = rel_path.split('/').filter(|c| !c.is_empty()).collect();
        if components.is_empty() {
            continue;
        }
        insert_node(&mut root_nodes, &components)?;
    }

    log::debug!("Tree structure built successfully.");
    Ok(root_nodes)
}

fn sibling_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name))
}

fn insert_node(level: &mut Vec<TreeNode>, components: &[&str]) -> Result<()> {
    let Some((name, rest)) = components.split_first() else {
        return Ok(());
    };
    let node_type = if rest.is_empty() {
        NodeType::File
    } else {
        NodeType::Directory
    };

    let candidate = TreeNode::new(name, node_type);
    let index = match level.binary_search_by(|node| sibling_order(node, &candidate)) {
        Ok(index) => index,
        Err(insertion_point) => {
            if let Some(clash) = level.iter().find(|n| n.name == *name) {
                return Err(AppError::Config(format!(
                    "Tree conflict: \"{}\" is both a file and a directory ({:?})",
                    name, clash.node_type
                )));
            }
            level.insert(insertion_point, candidate);
            insertion_point
        }
    };

    if !rest.is_empty() {
        insert_node(&mut level[index].children, rest)?;
    }
    Ok(())
}

/// Renders the tree with box-drawing connectors under a `<root_label>/` line.
pub fn render_tree(root_label: &str, nodes: &[TreeNode]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}/", root_label);
    render_level(&mut out, nodes, "");
    out
}

fn render_level(out: &mut String, nodes: &[TreeNode], prefix: &str) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let connector = if last { "└── " } else { "├── " };
        let suffix = if node.is_dir() { "/" } else { "" };
        let _ = writeln!(out, "{}{}{}{}", prefix, connector, node.name, suffix);
        if node.is_dir() {
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_level(out, &node.children, &child_prefix);
        }
    }
}
