//! Timed actions of a reconfiguration plan.

use std::cmp::Ordering;
use std::fmt;

use crate::model::{Element, Mapping, Node, Vm};

/// Kind of an action, also used to look up durations.
///
/// The declaration order is the tie-break used when two actions share the
/// same start and end: capacity is made available (boot) before it is used
/// and released (shutdown) last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    BootNode,
    /// Preparation of a VM image from a template. Only used as the first
    /// step of a re-instantiation.
    ForgeVm,
    BootVm,
    ResumeVm,
    MigrateVm,
    ReinstantiateVm,
    SuspendVm,
    ShutdownVm,
    ShutdownNode,
}

impl ActionKind {
    /// Every kind, in tie-break order.
    pub const ALL: [ActionKind; 9] = [
        ActionKind::BootNode,
        ActionKind::ForgeVm,
        ActionKind::BootVm,
        ActionKind::ResumeVm,
        ActionKind::MigrateVm,
        ActionKind::ReinstantiateVm,
        ActionKind::SuspendVm,
        ActionKind::ShutdownVm,
        ActionKind::ShutdownNode,
    ];

    /// Attribute key holding a per-element duration for this kind.
    pub fn attribute_key(self) -> &'static str {
        match self {
            ActionKind::BootNode | ActionKind::BootVm => "boot",
            ActionKind::ShutdownNode | ActionKind::ShutdownVm => "shutdown",
            ActionKind::ForgeVm => "forge",
            ActionKind::ResumeVm => "resume",
            ActionKind::MigrateVm => "migrate",
            ActionKind::ReinstantiateVm => "reinstantiate",
            ActionKind::SuspendVm => "suspend",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::BootNode => "bootNode",
            ActionKind::ForgeVm => "forgeVM",
            ActionKind::BootVm => "bootVM",
            ActionKind::ResumeVm => "resumeVM",
            ActionKind::MigrateVm => "migrateVM",
            ActionKind::ReinstantiateVm => "reinstantiateVM",
            ActionKind::SuspendVm => "suspendVM",
            ActionKind::ShutdownVm => "shutdownVM",
            ActionKind::ShutdownNode => "shutdownNode",
        };
        f.write_str(s)
    }
}

/// What an action does to the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    BootNode { node: Node },
    ShutdownNode { node: Node },
    BootVm { vm: Vm, node: Node },
    ShutdownVm { vm: Vm, node: Node },
    MigrateVm { vm: Vm, src: Node, dst: Node },
    /// The VM is relocated by forging a clone from its template, booting
    /// the clone on `dst` and shutting the original down on `src`. The
    /// clone takes over the identity of the VM.
    ReinstantiateVm { vm: Vm, src: Node, dst: Node },
    SuspendVm { vm: Vm, src: Node, dst: Node },
    ResumeVm { vm: Vm, src: Node, dst: Node },
}

impl Operation {
    pub fn kind(&self) -> ActionKind {
        match self {
            Operation::BootNode { .. } => ActionKind::BootNode,
            Operation::ShutdownNode { .. } => ActionKind::ShutdownNode,
            Operation::BootVm { .. } => ActionKind::BootVm,
            Operation::ShutdownVm { .. } => ActionKind::ShutdownVm,
            Operation::MigrateVm { .. } => ActionKind::MigrateVm,
            Operation::ReinstantiateVm { .. } => ActionKind::ReinstantiateVm,
            Operation::SuspendVm { .. } => ActionKind::SuspendVm,
            Operation::ResumeVm { .. } => ActionKind::ResumeVm,
        }
    }

    /// The element whose state changes.
    pub fn subject(&self) -> Element {
        match *self {
            Operation::BootNode { node } | Operation::ShutdownNode { node } => node.into(),
            Operation::BootVm { vm, .. }
            | Operation::ShutdownVm { vm, .. }
            | Operation::MigrateVm { vm, .. }
            | Operation::ReinstantiateVm { vm, .. }
            | Operation::SuspendVm { vm, .. }
            | Operation::ResumeVm { vm, .. } => vm.into(),
        }
    }

    /// Applies the operation. Returns `false`, leaving the mapping
    /// untouched, when the operation is illegal in the current state.
    pub fn apply(&self, map: &mut Mapping) -> bool {
        match *self {
            Operation::BootNode { node } => map.is_offline(node) && map.add_online_node(node),
            Operation::ShutdownNode { node } => map.is_online(node) && map.add_offline_node(node),
            Operation::BootVm { vm, node } => map.is_ready(vm) && map.add_running_vm(vm, node),
            Operation::ShutdownVm { vm, node } => {
                map.is_running(vm) && map.vm_location(vm) == Some(node) && map.add_ready_vm(vm)
            }
            Operation::MigrateVm { vm, src, dst }
            | Operation::ReinstantiateVm { vm, src, dst } => {
                map.is_running(vm) && map.vm_location(vm) == Some(src) && map.add_running_vm(vm, dst)
            }
            Operation::SuspendVm { vm, src, dst } => {
                map.is_running(vm) && map.vm_location(vm) == Some(src) && map.add_sleeping_vm(vm, dst)
            }
            Operation::ResumeVm { vm, src, dst } => {
                map.is_sleeping(vm) && map.vm_location(vm) == Some(src) && map.add_running_vm(vm, dst)
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::BootNode { node } | Operation::ShutdownNode { node } => {
                write!(f, "{}({})", self.kind(), node)
            }
            Operation::BootVm { vm, node } | Operation::ShutdownVm { vm, node } => {
                write!(f, "{}({}, on={})", self.kind(), vm, node)
            }
            Operation::MigrateVm { vm, src, dst }
            | Operation::ReinstantiateVm { vm, src, dst }
            | Operation::SuspendVm { vm, src, dst }
            | Operation::ResumeVm { vm, src, dst } => {
                write!(f, "{}({}, from={}, to={})", self.kind(), vm, src, dst)
            }
        }
    }
}

/// An operation scheduled over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    pub start: i64,
    pub end: i64,
    pub op: Operation,
}

impl Action {
    pub fn new(op: Operation, start: i64, end: i64) -> Self {
        debug_assert!(start <= end, "action ends before it starts");
        Self { start, end, op }
    }

    pub fn kind(&self) -> ActionKind {
        self.op.kind()
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Deterministic execution order: start, end, kind, then subject id.
    pub fn schedule_cmp(&self, other: &Action) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
            .then(self.kind().cmp(&other.kind()))
            .then(self.op.subject().cmp(&other.op.subject()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.start, self.end, self.op)
    }
}
