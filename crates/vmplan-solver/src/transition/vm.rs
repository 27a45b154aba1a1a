//! VM transitions.

use vmplan_core::{Action, ActionKind, Element, Node, Operation, Result, SchedulerError, Vm, VmState};

use super::{Transition, TransitionContext};
use crate::cp::{DomainView, IntVar, Linear, ReifEqConst, Select};
use crate::slice::Slice;

/// Attribute marking a VM that may be re-instantiated instead of migrated.
pub const CLONE_ATTRIBUTE: &str = "clone";

/// Attribute naming the template a clone of the VM is forged from.
pub const TEMPLATE_ATTRIBUTE: &str = "template";

fn node_of(value: i64) -> Node {
    Node(value as u32)
}

fn source_of(ctx: &TransitionContext<'_>, vm: Vm) -> Result<Node> {
    ctx.model
        .mapping()
        .vm_location(vm)
        .ok_or_else(|| SchedulerError::inconsistency(format!("{} is not hosted", vm)))
}

/// A VM that keeps its state. A running VM stays on its node.
#[derive(Debug, Clone)]
pub struct StayVm {
    vm: Vm,
    state: VmState,
    moment: IntVar,
    duration: IntVar,
    up: IntVar,
    c_slice: Option<Slice>,
    d_slice: Option<Slice>,
}

impl StayVm {
    pub fn build(ctx: &mut TransitionContext<'_>, vm: Vm, state: VmState) -> Result<Self> {
        let (c_slice, d_slice) = if state == VmState::Running {
            let host = source_of(ctx, vm)?;
            let demand = ctx.demand(vm);
            let c = ctx.c_slice(vm, host, ctx.start, demand.clone());
            let hoster = ctx.constant(host.id() as i64);
            let label = format!("stay({})", vm);
            let d = ctx.d_slice(vm, &label, ctx.start, hoster, demand);
            (Some(c), Some(d))
        } else {
            (None, None)
        };
        Ok(Self {
            vm,
            state,
            moment: ctx.start,
            duration: ctx.constant(0),
            up: ctx.constant((state == VmState::Running) as i64),
            c_slice,
            d_slice,
        })
    }

    pub fn vm(&self) -> Vm {
        self.vm
    }

    pub fn vm_state(&self) -> VmState {
        self.state
    }
}

impl Transition for StayVm {
    fn element(&self) -> Element {
        self.vm.into()
    }

    fn start(&self) -> IntVar {
        self.moment
    }

    fn end(&self) -> IntVar {
        self.moment
    }

    fn duration(&self) -> IntVar {
        self.duration
    }

    fn state(&self) -> IntVar {
        self.up
    }

    fn c_slice(&self) -> Option<&Slice> {
        self.c_slice.as_ref()
    }

    fn d_slice(&self) -> Option<&Slice> {
        self.d_slice.as_ref()
    }

    fn materialize(&self, _view: &dyn DomainView) -> Option<Action> {
        None
    }
}

/// A ready VM that is booted on some node.
#[derive(Debug, Clone)]
pub struct BootVm {
    vm: Vm,
    start: IntVar,
    end: IntVar,
    duration: IntVar,
    up: IntVar,
    d_slice: Slice,
}

impl BootVm {
    pub fn build(ctx: &mut TransitionContext<'_>, vm: Vm) -> Result<Self> {
        let d = ctx.bounded_duration(ActionKind::BootVm, vm)?;
        let label = format!("bootVM({})", vm);
        let start = ctx.time_var(&format!("{}.start", label));
        let end = ctx.time_var(&format!("{}.end", label));
        let duration = ctx.constant(d);
        ctx.link(start, duration, end);
        let hoster = ctx.host_var(&format!("{}.hoster", label));
        let demand = ctx.demand(vm);
        let d_slice = ctx.d_slice(vm, &label, start, hoster, demand);
        Ok(Self {
            vm,
            start,
            end,
            duration,
            up: ctx.constant(1),
            d_slice,
        })
    }

    pub fn vm(&self) -> Vm {
        self.vm
    }
}

impl Transition for BootVm {
    fn element(&self) -> Element {
        self.vm.into()
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
        self.up
    }

    fn d_slice(&self) -> Option<&Slice> {
        Some(&self.d_slice)
    }

    fn materialize(&self, view: &dyn DomainView) -> Option<Action> {
        let node = node_of(self.d_slice.host(view)?);
        Some(Action::new(
            Operation::BootVm { vm: self.vm, node },
            view.lb(self.start),
            view.lb(self.end),
        ))
    }
}

/// A running VM leaving its node: shut down, or suspended on it.
#[derive(Debug, Clone)]
struct Departure {
    vm: Vm,
    src: Node,
    start: IntVar,
    end: IntVar,
    duration: IntVar,
    up: IntVar,
    c_slice: Slice,
}

impl Departure {
    fn build(ctx: &mut TransitionContext<'_>, vm: Vm, kind: ActionKind) -> Result<Self> {
        let src = source_of(ctx, vm)?;
        let d = ctx.bounded_duration(kind, vm)?;
        let label = format!("{}({})", kind, vm);
        let start = ctx.time_var(&format!("{}.start", label));
        let end = ctx.time_var(&format!("{}.end", label));
        let duration = ctx.constant(d);
        ctx.link(start, duration, end);
        let demand = ctx.demand(vm);
        let c_slice = ctx.c_slice(vm, src, end, demand);
        Ok(Self {
            vm,
            src,
            start,
            end,
            duration,
            up: ctx.constant(0),
            c_slice,
        })
    }
}

/// A running VM turned off.
#[derive(Debug, Clone)]
pub struct ShutdownVm(Departure);

impl ShutdownVm {
    pub fn build(ctx: &mut TransitionContext<'_>, vm: Vm) -> Result<Self> {
        Departure::build(ctx, vm, ActionKind::ShutdownVm).map(Self)
    }

    pub fn vm(&self) -> Vm {
        self.0.vm
    }
}

/// A running VM suspended on its node.
#[derive(Debug, Clone)]
pub struct SuspendVm(Departure);

impl SuspendVm {
    pub fn build(ctx: &mut TransitionContext<'_>, vm: Vm) -> Result<Self> {
        Departure::build(ctx, vm, ActionKind::SuspendVm).map(Self)
    }

    pub fn vm(&self) -> Vm {
        self.0.vm
    }

    /// The node keeping the suspended VM.
    pub fn source(&self) -> Node {
        self.0.src
    }
}

macro_rules! departure_transition {
    ($ty:ty, |$d:ident| $op:expr) => {
        impl Transition for $ty {
            fn element(&self) -> Element {
                self.0.vm.into()
            }

            fn start(&self) -> IntVar {
                self.0.start
            }

            fn end(&self) -> IntVar {
                self.0.end
            }

            fn duration(&self) -> IntVar {
                self.0.duration
            }

            fn state(&self) -> IntVar {
                self.0.up
            }

            fn c_slice(&self) -> Option<&Slice> {
                Some(&self.0.c_slice)
            }

            fn materialize(&self, view: &dyn DomainView) -> Option<Action> {
                let $d = &self.0;
                Some(Action::new($op, view.lb($d.start), view.lb($d.end)))
            }
        }
    };
}

departure_transition!(ShutdownVm, |d| Operation::ShutdownVm {
    vm: d.vm,
    node: d.src
});
departure_transition!(SuspendVm, |d| Operation::SuspendVm {
    vm: d.vm,
    src: d.src,
    dst: d.src
});

/// A sleeping VM resumed on some node.
///
/// The sleeping image stays on the source node until the resume ends, so
/// the transition also holds a consuming slice without demand.
#[derive(Debug, Clone)]
pub struct ResumeVm {
    vm: Vm,
    src: Node,
    start: IntVar,
    end: IntVar,
    duration: IntVar,
    up: IntVar,
    c_slice: Slice,
    d_slice: Slice,
}

impl ResumeVm {
    pub fn build(ctx: &mut TransitionContext<'_>, vm: Vm) -> Result<Self> {
        let src = source_of(ctx, vm)?;
        let d = ctx.bounded_duration(ActionKind::ResumeVm, vm)?;
        let label = format!("resumeVM({})", vm);
        let start = ctx.time_var(&format!("{}.start", label));
        let end = ctx.time_var(&format!("{}.end", label));
        let duration = ctx.constant(d);
        ctx.link(start, duration, end);
        let image = ctx.no_demand();
        let c_slice = ctx.c_slice(vm, src, end, image);
        let hoster = ctx.host_var(&format!("{}.hoster", label));
        let demand = ctx.demand(vm);
        let d_slice = ctx.d_slice(vm, &label, start, hoster, demand);
        Ok(Self {
            vm,
            src,
            start,
            end,
            duration,
            up: ctx.constant(1),
            c_slice,
            d_slice,
        })
    }

    pub fn vm(&self) -> Vm {
        self.vm
    }
}

impl Transition for ResumeVm {
    fn element(&self) -> Element {
        self.vm.into()
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
        self.up
    }

    fn c_slice(&self) -> Option<&Slice> {
        Some(&self.c_slice)
    }

    fn d_slice(&self) -> Option<&Slice> {
        Some(&self.d_slice)
    }

    fn materialize(&self, view: &dyn DomainView) -> Option<Action> {
        let dst = node_of(self.d_slice.host(view)?);
        Some(Action::new(
            Operation::ResumeVm {
                vm: self.vm,
                src: self.src,
                dst,
            },
            view.lb(self.start),
            view.lb(self.end),
        ))
    }
}

/// A running VM that stays running, possibly elsewhere.
///
/// `stay` holds iff the VM ends on its source node, in which case the
/// transition lasts 0. Otherwise it is migrated, or re-instantiated when
/// the VM is clone-eligible and `method` is set: a clone is forged from
/// the template before the transition starts, booted on the destination,
/// then the original is shut down.
#[derive(Debug, Clone)]
pub struct RelocatableVm {
    vm: Vm,
    src: Node,
    start: IntVar,
    end: IntVar,
    duration: IntVar,
    up: IntVar,
    stay: IntVar,
    method: Option<IntVar>,
    forge: i64,
    c_slice: Slice,
    d_slice: Slice,
}

impl RelocatableVm {
    pub fn build(ctx: &mut TransitionContext<'_>, vm: Vm) -> Result<Self> {
        let src = source_of(ctx, vm)?;
        let label = format!("relocatable({})", vm);
        let migrate = ctx.bounded_duration(ActionKind::MigrateVm, vm)?;

        let start = ctx.time_var(&format!("{}.start", label));
        let end = ctx.time_var(&format!("{}.end", label));
        let hoster = ctx.host_var(&format!("{}.hoster", label));
        let stay = ctx.bool_var(&format!("{}.stay", label));
        ctx.csp.post(ReifEqConst::new(stay, hoster, src.id() as i64));

        let zero = ctx.constant(0);
        let migrate_var = ctx.constant(migrate);
        let (duration, method, forge) = if Self::is_clone_eligible(ctx, vm) {
            let boot = ctx.bounded_duration(ActionKind::BootVm, vm)?;
            let shutdown = ctx.bounded_duration(ActionKind::ShutdownVm, vm)?;
            let forge = ctx.bounded_duration(ActionKind::ForgeVm, vm)?;
            let reinstantiate = boot + shutdown;

            let method = ctx.bool_var(&format!("{}.method", label));
            let reinstantiate_var = ctx.constant(reinstantiate);
            let moving = ctx.csp.int_var(
                &format!("{}.moveDuration", label),
                migrate.min(reinstantiate),
                migrate.max(reinstantiate),
            );
            ctx.csp
                .post(Select::new(method, migrate_var, reinstantiate_var, moving));
            let duration = ctx.csp.int_var(
                &format!("{}.duration", label),
                0,
                migrate.max(reinstantiate),
            );
            ctx.csp.post(Select::new(stay, moving, zero, duration));
            // a VM that stays is not re-instantiated
            ctx.csp.post(Linear::le(vec![(1, method), (1, stay)], 1));
            // the clone is forged before the transition starts
            ctx.csp.post(Linear::ge(vec![(1, start), (-forge, method)], 0));
            (duration, Some(method), forge)
        } else {
            let duration = ctx.csp.int_var(&format!("{}.duration", label), 0, migrate);
            ctx.csp.post(Select::new(stay, migrate_var, zero, duration));
            (duration, None, 0)
        };
        ctx.link(start, duration, end);
        // a VM that stays keeps its slot from the beginning: stay => start = 0
        let max_end = ctx.max_end;
        ctx.csp
            .post(Linear::le(vec![(1, start), (max_end, stay)], max_end));

        let demand = ctx.demand(vm);
        let c_slice = ctx.c_slice(vm, src, end, demand.clone());
        let d_slice = ctx.d_slice(vm, &label, start, hoster, demand);
        Ok(Self {
            vm,
            src,
            start,
            end,
            duration,
            up: ctx.constant(1),
            stay,
            method,
            forge,
            c_slice,
            d_slice,
        })
    }

    /// A VM may be re-instantiated when it is flagged as clonable and
    /// names a template.
    pub fn is_clone_eligible(ctx: &TransitionContext<'_>, vm: Vm) -> bool {
        let attrs = ctx.model.attributes();
        attrs.get_bool(vm, CLONE_ATTRIBUTE) == Some(true) && attrs.is_set(vm, TEMPLATE_ATTRIBUTE)
    }

    pub fn vm(&self) -> Vm {
        self.vm
    }

    pub fn source(&self) -> Node {
        self.src
    }

    /// Boolean set iff the VM ends on its source node.
    pub fn stay(&self) -> IntVar {
        self.stay
    }

    /// Boolean set iff the VM is re-instantiated, for clone-eligible VMs.
    pub fn method(&self) -> Option<IntVar> {
        self.method
    }

    /// Duration of the clone preparation, 0 when not clone-eligible.
    pub fn forge_duration(&self) -> i64 {
        self.forge
    }
}

impl Transition for RelocatableVm {
    fn element(&self) -> Element {
        self.vm.into()
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
        self.up
    }

    fn c_slice(&self) -> Option<&Slice> {
        Some(&self.c_slice)
    }

    fn d_slice(&self) -> Option<&Slice> {
        Some(&self.d_slice)
    }

    fn materialize(&self, view: &dyn DomainView) -> Option<Action> {
        if view.value(self.stay) != Some(0) {
            return None;
        }
        let dst = node_of(self.d_slice.host(view)?);
        let (start, end) = (view.lb(self.start), view.lb(self.end));
        let reinstantiate = self.method.is_some_and(|m| view.value(m) == Some(1));
        let action = if reinstantiate {
            Action::new(
                Operation::ReinstantiateVm {
                    vm: self.vm,
                    src: self.src,
                    dst,
                },
                start - self.forge,
                end,
            )
        } else {
            Action::new(
                Operation::MigrateVm {
                    vm: self.vm,
                    src: self.src,
                    dst,
                },
                start,
                end,
            )
        };
        Some(action)
    }
}
