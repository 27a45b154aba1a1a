//! Node transitions.
//!
//! A node has a boolean state telling whether it is online at the end of
//! the reconfiguration, and a hosting window: VMs may arrive once it has
//! started and must be gone once it has ended.

use vmplan_core::{Action, ActionKind, Element, Node, Operation, Result};

use super::{Transition, TransitionContext};
use crate::cp::{DomainView, IntVar, Select};

/// A node offline at the beginning, booted if `state` is set.
#[derive(Debug, Clone)]
pub struct BootableNode {
    node: Node,
    state: IntVar,
    start: IntVar,
    end: IntVar,
    duration: IntVar,
    hosting_start: IntVar,
    hosting_end: IntVar,
}

impl BootableNode {
    pub fn build(ctx: &mut TransitionContext<'_>, node: Node) -> Result<Self> {
        let d = ctx.bounded_duration(ActionKind::BootNode, node)?;
        let label = format!("bootableNode({})", node);
        let state = ctx.bool_var(&format!("{}.state", label));
        let start = ctx.time_var(&format!("{}.start", label));
        let end = ctx.time_var(&format!("{}.end", label));

        let zero = ctx.constant(0);
        let boot = ctx.constant(d);
        let duration = ctx.csp.int_var(&format!("{}.duration", label), 0, d);
        ctx.csp.post(Select::new(state, zero, boot, duration));
        ctx.link(start, duration, end);

        // a node left offline never hosts anything
        let hosting_end = ctx.csp.int_var(&format!("{}.hostingEnd", label), 0, ctx.max_end);
        ctx.csp.post(Select::new(state, ctx.start, ctx.end, hosting_end));
        Ok(Self {
            node,
            state,
            start,
            end,
            duration,
            hosting_start: end,
            hosting_end,
        })
    }

    pub fn node(&self) -> Node {
        self.node
    }

    pub fn hosting_start(&self) -> IntVar {
        self.hosting_start
    }

    pub fn hosting_end(&self) -> IntVar {
        self.hosting_end
    }
}

impl Transition for BootableNode {
    fn element(&self) -> Element {
        self.node.into()
    }

    fn start(&self) -> IntVar {
        self.start
    }

    fn end(&self) -> IntVar {
        self.end
    }

    fn duration(&self) -> IntVar {
        self.duration
    }

    fn state(&self) -> IntVar {
        self.state
    }

    fn materialize(&self, view: &dyn DomainView) -> Option<Action> {
        (view.value(self.state) == Some(1)).then(|| {
            Action::new(
                Operation::BootNode { node: self.node },
                view.lb(self.start),
                view.lb(self.end),
            )
        })
    }
}

/// A node online at the beginning, shut down if `state` is unset.
///
/// The shutdown starts when the hosting window closes, so every VM must
/// have left by then.
#[derive(Debug, Clone)]
pub struct ShutdownableNode {
    node: Node,
    state: IntVar,
    start: IntVar,
    end: IntVar,
    duration: IntVar,
    hosting_start: IntVar,
    hosting_end: IntVar,
}

impl ShutdownableNode {
    pub fn build(ctx: &mut TransitionContext<'_>, node: Node) -> Result<Self> {
        let d = ctx.bounded_duration(ActionKind::ShutdownNode, node)?;
        let label = format!("shutdownableNode({})", node);
        let state = ctx.bool_var(&format!("{}.state", label));
        let start = ctx.time_var(&format!("{}.start", label));
        let end = ctx.time_var(&format!("{}.end", label));

        let zero = ctx.constant(0);
        let shutdown = ctx.constant(d);
        let duration = ctx.csp.int_var(&format!("{}.duration", label), 0, d);
        ctx.csp.post(Select::new(state, shutdown, zero, duration));
        ctx.link(start, duration, end);

        let hosting_end = ctx.csp.int_var(&format!("{}.hostingEnd", label), 0, ctx.max_end);
        ctx.csp.post(Select::new(state, start, ctx.end, hosting_end));
        Ok(Self {
            node,
            state,
            start,
            end,
            duration,
            hosting_start: ctx.start,
            hosting_end,
        })
    }

    pub fn node(&self) -> Node {
        self.node
    }

    pub fn hosting_start(&self) -> IntVar {
        self.hosting_start
    }

    pub fn hosting_end(&self) -> IntVar {
        self.hosting_end
    }
}

impl Transition for ShutdownableNode {
    fn element(&self) -> Element {
        self.node.into()
    }

    fn start(&self) -> IntVar {
        self.start
    }

    fn end(&self) -> IntVar {
        self.end
    }

    fn duration(&self) -> IntVar {
        self.duration
    }

    fn state(&self) -> IntVar {
        self.state
    }

    fn materialize(&self, view: &dyn DomainView) -> Option<Action> {
        (view.value(self.state) == Some(0)).then(|| {
            Action::new(
                Operation::ShutdownNode { node: self.node },
                view.lb(self.start),
                view.lb(self.end),
            )
        })
    }
}
