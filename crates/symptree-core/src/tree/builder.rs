//! Flat parent-pointer records to nested decision tree.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{branch_label, DecisionNode};

/// Data-integrity problem found while building a tree.
///
/// Warnings never abort construction; the builder keeps the first match and
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// Records exist but none has a null parent
    NoRoot,
    /// More than one record has a null parent; the first one is used
    MultipleRoots { ids: Vec<i64> },
    /// A parent branch is claimed twice; the later record is ignored
    DuplicateBranch {
        parent_id: i64,
        is_yes_path: bool,
        ignored_id: i64,
    },
    /// A non-root record has no branch flag and can never be reached
    MissingBranchFlag { id: i64 },
    /// A disease record has children
    ChildOfDisease { parent_id: i64, child_id: i64 },
    /// Records not reachable from the root
    Unreachable { ids: Vec<i64> },
    /// A record was met twice on the way down; descent stops there
    Cycle { id: i64 },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::NoRoot => write!(f, "no root node (every node has a parent)"),
            IntegrityWarning::MultipleRoots { ids } => {
                write!(f, "multiple root nodes {:?}; using the first", ids)
            }
            IntegrityWarning::DuplicateBranch {
                parent_id,
                is_yes_path,
                ignored_id,
            } => write!(
                f,
                "{} branch of node {} claimed twice; ignoring node {}",
                branch_label(*is_yes_path),
                parent_id,
                ignored_id
            ),
            IntegrityWarning::MissingBranchFlag { id } => {
                write!(f, "node {} has a parent but no branch flag", id)
            }
            IntegrityWarning::ChildOfDisease { parent_id, child_id } => write!(
                f,
                "disease node {} has child {}",
                parent_id, child_id
            ),
            IntegrityWarning::Unreachable { ids } => {
                write!(f, "nodes {:?} are not reachable from the root", ids)
            }
            IntegrityWarning::Cycle { id } => write!(f, "node {} is its own ancestor", id),
        }
    }
}

/// A node of the built tree, owning its branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub node: DecisionNode,
    pub yes: Option<Box<TreeNode>>,
    pub no: Option<Box<TreeNode>>,
}

impl TreeNode {
    /// The child followed for `answer`.
    pub fn branch(&self, answer: bool) -> Option<&TreeNode> {
        if answer {
            self.yes.as_deref()
        } else {
            self.no.as_deref()
        }
    }

    /// Human-readable code of this node.
    pub fn code(&self) -> &str {
        &self.node.node_id
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.yes.as_ref().map_or(0, |n| n.size()) + self.no.as_ref().map_or(0, |n| n.size())
    }

    fn find(&self, node_id: &str) -> Option<&TreeNode> {
        if self.node.node_id == node_id {
            return Some(self);
        }
        self.yes
            .as_deref()
            .and_then(|n| n.find(node_id))
            .or_else(|| self.no.as_deref().and_then(|n| n.find(node_id)))
    }
}

/// Nested binary decision tree, rebuilt from the flat records on every load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    warnings: Vec<IntegrityWarning>,
}

impl DecisionTree {
    /// Build a tree from an unordered record set.
    ///
    /// The root is the first record (input order) without a parent. Each
    /// branch is filled by the first record (input order) claiming it.
    pub fn build(nodes: &[DecisionNode]) -> Self {
        let mut warnings = Vec::new();

        let roots: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_root())
            .map(|(idx, _)| idx)
            .collect();
        if roots.len() > 1 {
            warnings.push(IntegrityWarning::MultipleRoots {
                ids: roots.iter().map(|&idx| nodes[idx].id).collect(),
            });
        }

        // (parent_id, is_yes_path) -> index of the first record claiming it
        let mut branches: HashMap<(i64, bool), usize> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            let Some(parent_id) = node.parent_id else {
                continue;
            };
            let Some(is_yes_path) = node.is_yes_path else {
                warnings.push(IntegrityWarning::MissingBranchFlag { id: node.id });
                continue;
            };
            match branches.entry((parent_id, is_yes_path)) {
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
                Entry::Occupied(_) => warnings.push(IntegrityWarning::DuplicateBranch {
                    parent_id,
                    is_yes_path,
                    ignored_id: node.id,
                }),
            }
        }

        let root = match roots.first() {
            Some(&root_idx) => {
                let mut assembler = Assembler {
                    nodes,
                    branches,
                    visited: vec![false; nodes.len()],
                    warnings: &mut warnings,
                };
                let root = assembler.assemble(root_idx);

                let unreachable: Vec<i64> = nodes
                    .iter()
                    .zip(&assembler.visited)
                    .filter(|(_, seen)| !**seen)
                    .map(|(n, _)| n.id)
                    .collect();
                if !unreachable.is_empty() {
                    warnings.push(IntegrityWarning::Unreachable { ids: unreachable });
                }
                Some(root)
            }
            None => {
                if !nodes.is_empty() {
                    warnings.push(IntegrityWarning::NoRoot);
                }
                None
            }
        };

        for warning in &warnings {
            tracing::warn!(%warning, "decision tree integrity warning");
        }

        Self { root, warnings }
    }

    /// The entry point of every diagnosis, if any.
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Check if the tree has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::size)
    }

    /// Follow a sequence of answers from the root.
    pub fn descend(&self, path: &[bool]) -> Option<&TreeNode> {
        path.iter()
            .try_fold(self.root.as_ref()?, |node, &answer| node.branch(answer))
    }

    /// Find the first node (yes-branch first) with the given code.
    pub fn find(&self, node_id: &str) -> Option<&TreeNode> {
        self.root.as_ref().and_then(|root| root.find(node_id))
    }

    /// Integrity warnings collected while building.
    pub fn warnings(&self) -> &[IntegrityWarning] {
        &self.warnings
    }

    /// Serialize the nested tree (root only) to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }
}

struct Assembler<'a, 'w> {
    nodes: &'a [DecisionNode],
    branches: HashMap<(i64, bool), usize>,
    visited: Vec<bool>,
    warnings: &'w mut Vec<IntegrityWarning>,
}

impl<'a, 'w> Assembler<'a, 'w> {
    fn assemble(&mut self, idx: usize) -> TreeNode {
        self.visited[idx] = true;
        let nodes = self.nodes;
        let record = &nodes[idx];

        let yes = self.child(record, true);
        let no = self.child(record, false);

        if record.is_terminal() {
            for child in yes.iter().chain(no.iter()) {
                self.warnings.push(IntegrityWarning::ChildOfDisease {
                    parent_id: record.id,
                    child_id: child.node.id,
                });
            }
        }

        TreeNode {
            node: record.clone(),
            yes,
            no,
        }
    }

    fn child(&mut self, parent: &DecisionNode, is_yes_path: bool) -> Option<Box<TreeNode>> {
        let idx = *self.branches.get(&(parent.id, is_yes_path))?;
        if self.visited[idx] {
            self.warnings.push(IntegrityWarning::Cycle {
                id: self.nodes[idx].id,
            });
            return None;
        }
        Some(Box::new(self.assemble(idx)))
    }
}
