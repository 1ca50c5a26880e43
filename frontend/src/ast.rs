//! Abstract syntax tree for UOScript
//!
//! The tree is arena-allocated: nodes live in a flat `Vec` inside [`Ast`]
//! and refer to each other through [`NodeId`] indices. Sibling links are
//! doubly linked so the interpreter can scan forward and backward over
//! statements in O(1) per step.

use std::fmt;

/// Index of a node inside an [`Ast`] arena.
///
/// Ids are stable for the lifetime of the tree, which makes them usable as
/// identity keys (loop iterators are named after the id of their loop node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Structure
    Script,
    Statement,
    Command,
    LogicalExpression,
    UnaryExpression,
    BinaryExpression,

    // Control flow keywords
    If,
    ElseIf,
    Else,
    EndIf,
    While,
    EndWhile,
    For,
    Foreach,
    EndFor,
    Break,
    Continue,
    Stop,
    Replay,

    // Comparison operators
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Logical operators
    Not,
    And,
    Or,

    // Values
    StringLit,
    Serial,
    Integer,
    Double,
    Operand,

    // Modifiers
    Quiet,
    Force,
}

impl NodeKind {
    /// Comparison operator tags, as they appear inside binary expressions.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            NodeKind::Equal
                | NodeKind::NotEqual
                | NodeKind::LessThan
                | NodeKind::LessThanOrEqual
                | NodeKind::GreaterThan
                | NodeKind::GreaterThanOrEqual
        )
    }

    /// Tags that terminate an argument list when walking a sibling chain.
    pub fn ends_arguments(self) -> bool {
        self.is_comparison() || matches!(self, NodeKind::And | NodeKind::Or)
    }

    /// Tags that open a loop construct.
    pub fn opens_loop(self) -> bool {
        matches!(self, NodeKind::While | NodeKind::For | NodeKind::Foreach)
    }

    /// Tags that close a loop construct.
    pub fn closes_loop(self) -> bool {
        matches!(self, NodeKind::EndWhile | NodeKind::EndFor)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    lexeme: String,
    line: usize,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Arena-allocated syntax tree with a Script node at the root.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    /// Create a tree holding only the root Script node.
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Script,
            lexeme: String::new(),
            line: 0,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        };
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new child under `parent` and return its id.
    pub fn push(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        lexeme: impl Into<String>,
        line: usize,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let prev = self.nodes[parent.index()].last_child;
        self.nodes.push(Node {
            kind,
            lexeme: lexeme.into(),
            line,
            parent: Some(parent),
            first_child: None,
            last_child: None,
            prev_sibling: prev,
            next_sibling: None,
        });

        let parent_node = &mut self.nodes[parent.index()];
        if parent_node.first_child.is_none() {
            parent_node.first_child = Some(id);
        }
        parent_node.last_child = Some(id);
        if let Some(prev) = prev {
            self.nodes[prev.index()].next_sibling = Some(id);
        }
        id
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    pub fn lexeme(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].lexeme
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.nodes[id.index()].line
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].prev_sibling
    }

    /// Iterate over the children of `id` in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            ast: self,
            next: self.first_child(id),
        }
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root is always present.
        self.nodes.len() <= 1
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

/// Sibling iterator returned by [`Ast::children`].
pub struct Children<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.ast.next_sibling(id);
        Some(id)
    }
}
