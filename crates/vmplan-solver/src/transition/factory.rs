//! Selection of the transition modelling a state change.

use std::collections::HashMap;

use vmplan_core::{Node, NodeState, Result, SchedulerError, Vm, VmState};

use super::{
    BootVm, BootableNode, NodeTransition, RelocatableVm, ResumeVm, ShutdownVm, ShutdownableNode,
    StayVm, SuspendVm, TransitionContext, VmTransition,
};

/// The VM transition variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmTransitionKind {
    Stay,
    Boot,
    Shutdown,
    Relocate,
    Suspend,
    Resume,
}

/// Maps a VM `(current state, next state)` pair to the transition
/// variant to build.
///
/// # Example
///
/// ```
/// use vmplan_core::VmState;
/// use vmplan_solver::transition::{TransitionFactory, VmTransitionKind};
///
/// let mut factory = TransitionFactory::new();
/// assert_eq!(
///     factory.vm_kind(VmState::Ready, VmState::Running),
///     Some(VmTransitionKind::Boot)
/// );
/// assert_eq!(factory.vm_kind(VmState::Sleeping, VmState::Ready), None);
///
/// factory.unregister(VmState::Running, VmState::Sleeping);
/// assert_eq!(factory.vm_kind(VmState::Running, VmState::Sleeping), None);
/// ```
#[derive(Debug, Clone)]
pub struct TransitionFactory {
    vms: HashMap<(VmState, VmState), VmTransitionKind>,
}

impl Default for TransitionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionFactory {
    /// A factory knowing every supported state change.
    pub fn new() -> Self {
        use VmState::*;
        let mut f = Self::empty();
        f.register(Ready, Ready, VmTransitionKind::Stay);
        f.register(Sleeping, Sleeping, VmTransitionKind::Stay);
        f.register(Ready, Running, VmTransitionKind::Boot);
        f.register(Running, Ready, VmTransitionKind::Shutdown);
        f.register(Running, Running, VmTransitionKind::Relocate);
        f.register(Running, Sleeping, VmTransitionKind::Suspend);
        f.register(Sleeping, Running, VmTransitionKind::Resume);
        f
    }

    /// A factory knowing no state change.
    pub fn empty() -> Self {
        Self {
            vms: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        from: VmState,
        to: VmState,
        kind: VmTransitionKind,
    ) -> Option<VmTransitionKind> {
        self.vms.insert((from, to), kind)
    }

    pub fn unregister(&mut self, from: VmState, to: VmState) -> Option<VmTransitionKind> {
        self.vms.remove(&(from, to))
    }

    pub fn vm_kind(&self, from: VmState, to: VmState) -> Option<VmTransitionKind> {
        self.vms.get(&(from, to)).copied()
    }

    /// Builds the transition of a VM.
    ///
    /// A VM that is not manageable and keeps its state stays where it is.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ModelInconsistency`] when no variant handles the
    /// state change or when a duration cannot be estimated.
    pub fn build_vm(
        &self,
        ctx: &mut TransitionContext<'_>,
        vm: Vm,
        from: VmState,
        to: VmState,
        manageable: bool,
    ) -> Result<VmTransition> {
        if from == to && !manageable {
            return StayVm::build(ctx, vm, from).map(VmTransition::Stay);
        }
        let kind = self.vm_kind(from, to).ok_or_else(|| {
            SchedulerError::inconsistency(format!(
                "no transition to go from {} to {} for {}",
                from, to, vm
            ))
        })?;
        Ok(match kind {
            VmTransitionKind::Stay => VmTransition::Stay(StayVm::build(ctx, vm, from)?),
            VmTransitionKind::Boot => VmTransition::Boot(BootVm::build(ctx, vm)?),
            VmTransitionKind::Shutdown => VmTransition::Shutdown(ShutdownVm::build(ctx, vm)?),
            VmTransitionKind::Relocate => VmTransition::Relocate(RelocatableVm::build(ctx, vm)?),
            VmTransitionKind::Suspend => VmTransition::Suspend(SuspendVm::build(ctx, vm)?),
            VmTransitionKind::Resume => VmTransition::Resume(ResumeVm::build(ctx, vm)?),
        })
    }

    /// Builds the transition of a node from its current state.
    pub fn build_node(
        &self,
        ctx: &mut TransitionContext<'_>,
        node: Node,
        state: NodeState,
    ) -> Result<NodeTransition> {
        Ok(match state {
            NodeState::Online => NodeTransition::Shutdown(ShutdownableNode::build(ctx, node)?),
            NodeState::Offline => NodeTransition::Boot(BootableNode::build(ctx, node)?),
        })
    }
}
