//! Element identifiers.

use std::fmt;

/// A physical node, identified by a dense integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node(pub u32);

/// A virtual machine, identified by a dense integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vm(pub u32);

impl Node {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl Vm {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm#{}", self.0)
    }
}

/// Either a node or a VM.
///
/// Used wherever an operation applies to both kinds of elements, such as
/// attributes and duration evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
    Node(Node),
    Vm(Vm),
}

impl Element {
    /// Returns the raw id of the element.
    pub fn id(self) -> u32 {
        match self {
            Element::Node(n) => n.0,
            Element::Vm(v) => v.0,
        }
    }
}

impl From<Node> for Element {
    fn from(n: Node) -> Self {
        Element::Node(n)
    }
}

impl From<Vm> for Element {
    fn from(v: Vm) -> Self {
        Element::Vm(v)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Node(n) => n.fmt(f),
            Element::Vm(v) => v.fmt(f),
        }
    }
}

/// State of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeState {
    Online,
    Offline,
}

/// State of a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VmState {
    /// Known to the datacenter but not placed anywhere.
    Ready,
    /// Running on an online node.
    Running,
    /// Suspended on a node; consumes no resources.
    Sleeping,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Online => write!(f, "online"),
            NodeState::Offline => write!(f, "offline"),
        }
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmState::Ready => write!(f, "ready"),
            VmState::Running => write!(f, "running"),
            VmState::Sleeping => write!(f, "sleeping"),
        }
    }
}
