//! Python syntax tree model consumed by the checker
//!
//! The tree is produced by an external parser and handed to this crate
//! read-only for the duration of one pass. Nodes live in a flat arena owned
//! by [`Ast`]; parents are index back-references used for navigation only.

use crate::diagnostic::Location;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index of a node within an [`Ast`] arena
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One imported name in a `from x import y as z` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Name as written in the source module
    pub name: String,
    /// Local alias, if any
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    pub fn aliased(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        }
    }
}

/// Node kind, one tag per syntactic shape the checker distinguishes.
///
/// Kind-specific payloads reference other arena nodes by id; every
/// referenced node is also present in the owning node's `children`, so the
/// generic child walk covers the whole subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Module root
    Module { name: String },
    FunctionDef { name: String },
    ClassDef { name: String },
    /// `a = b` / `a, b = c`; `targets` are the left-hand sides
    Assign { targets: Vec<NodeId> },
    /// A plain name reference
    Name { id: String },
    /// `value.attr`
    Attribute { attr: String },
    Tuple { elts: Vec<NodeId> },
    List { elts: Vec<NodeId> },
    /// `from <module> import <names>`; `level` counts leading dots
    ImportFrom {
        module: String,
        names: Vec<ImportedName>,
        level: u32,
    },
    Raise,
    Call,
    /// `except <ty>:`; `ty` is absent for a bare handler
    ExceptHandler { ty: Option<NodeId> },
    TryExcept {
        body: Vec<NodeId>,
        handlers: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    TryFinally {
        body: Vec<NodeId>,
        finalbody: Vec<NodeId>,
    },
    /// String literal
    Str { value: String },
    /// Any other literal, kept as its source text
    Const { repr: String },
    /// Expression statement wrapper
    Expr,
    Pass,
    Return,
}

impl NodeKind {
    /// Kind name for logs and contract-violation messages
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "module",
            NodeKind::FunctionDef { .. } => "functiondef",
            NodeKind::ClassDef { .. } => "classdef",
            NodeKind::Assign { .. } => "assign",
            NodeKind::Name { .. } => "name",
            NodeKind::Attribute { .. } => "attribute",
            NodeKind::Tuple { .. } => "tuple",
            NodeKind::List { .. } => "list",
            NodeKind::ImportFrom { .. } => "importfrom",
            NodeKind::Raise => "raise",
            NodeKind::Call => "call",
            NodeKind::ExceptHandler { .. } => "excepthandler",
            NodeKind::TryExcept { .. } => "tryexcept",
            NodeKind::TryFinally { .. } => "tryfinally",
            NodeKind::Str { .. } => "str",
            NodeKind::Const { .. } => "const",
            NodeKind::Expr => "expr",
            NodeKind::Pass => "pass",
            NodeKind::Return => "return",
        }
    }

    /// Whether this node establishes a scope able to resolve module imports
    pub fn resolves_imports(&self) -> bool {
        matches!(self, NodeKind::Module { .. })
    }
}

/// A node in the syntax tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Back-reference for upward navigation; never owns the parent
    pub parent: Option<NodeId>,
    /// Direct children in source order
    pub children: Vec<NodeId>,
    pub location: Location,
}

/// A parsed module as a flat arena of nodes
///
/// The first node in the arena is the root.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    /// Root node id, `None` for an empty tree
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    /// Node by id; ids handed out by the producer are always valid
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node by id, without the validity assumption
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Direct children of `id` in source order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of `id`, `None` at the root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes with their ids, in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

/// Number of nodes in the subtree rooted at `id`, inclusive of itself
pub fn count_tree_size(ast: &Ast, id: NodeId) -> usize {
    1 + ast
        .children(id)
        .iter()
        .map(|&child| count_tree_size(ast, child))
        .sum::<usize>()
}

/// Assembles an [`Ast`] arena node by node
///
/// The first node added becomes the root. Nodes are created detached and
/// wired up with [`AstBuilder::attach`]; kind payloads that reference other
/// nodes (assignment targets, handler lists, ...) use the ids returned by
/// [`AstBuilder::add`].
pub struct AstBuilder {
    file: PathBuf,
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            nodes: Vec::new(),
        }
    }

    /// Create a detached node and return its id
    pub fn add(&mut self, kind: NodeKind, line: usize, column: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            location: Location::new(self.file.clone(), line, column),
        });
        id
    }

    /// Append `child` to `parent`'s children and set its back-reference
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn build(self) -> Ast {
        Ast { nodes: self.nodes }
    }
}
