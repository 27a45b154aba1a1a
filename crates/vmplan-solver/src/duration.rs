//! Estimated durations of actions.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use vmplan_config::DurationConfig;
use vmplan_core::{ActionKind, Element, Model, Result, SchedulerError};

/// Estimates the duration of an action on an element.
pub trait ActionDurationEvaluator: Send + Sync + Debug {
    fn evaluate(&self, model: &Model, e: Element) -> i64;
}

/// The same duration for every element.
#[derive(Debug, Clone, Copy)]
pub struct ConstantDuration(pub i64);

impl ActionDurationEvaluator for ConstantDuration {
    fn evaluate(&self, _model: &Model, _e: Element) -> i64 {
        self.0
    }
}

/// Reads the duration from an integer attribute of the element, falls
/// back to another evaluator when the attribute is missing.
#[derive(Debug, Clone)]
pub struct AttributeDuration {
    key: String,
    fallback: Arc<dyn ActionDurationEvaluator>,
}

impl AttributeDuration {
    pub fn new(key: impl Into<String>, fallback: Arc<dyn ActionDurationEvaluator>) -> Self {
        Self {
            key: key.into(),
            fallback,
        }
    }
}

impl ActionDurationEvaluator for AttributeDuration {
    fn evaluate(&self, model: &Model, e: Element) -> i64 {
        model
            .attributes()
            .get_int(e, &self.key)
            .unwrap_or_else(|| self.fallback.evaluate(model, e))
    }
}

/// A duration computed by a closure.
pub struct FnDuration<F>(pub F);

impl<F> Debug for FnDuration<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnDuration")
    }
}

impl<F> ActionDurationEvaluator for FnDuration<F>
where
    F: Fn(&Model, Element) -> i64 + Send + Sync,
{
    fn evaluate(&self, model: &Model, e: Element) -> i64 {
        (self.0)(model, e)
    }
}

/// Duration evaluators, by action kind.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vmplan_core::{ActionKind, Model, Vm};
/// use vmplan_solver::duration::{ConstantDuration, DurationEvaluators};
///
/// let mut mo = Model::new();
/// let v = mo.new_vm();
/// mo.attributes_mut().put(v, "migrate", 7);
///
/// let mut dev = DurationEvaluators::new_bundle();
/// assert_eq!(dev.evaluate(&mo, ActionKind::MigrateVm, v.into()).unwrap(), 7);
/// assert_eq!(dev.evaluate(&mo, ActionKind::BootVm, v.into()).unwrap(), 1);
///
/// dev.register(ActionKind::BootVm, Arc::new(ConstantDuration(4)));
/// assert_eq!(dev.evaluate(&mo, ActionKind::BootVm, v.into()).unwrap(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DurationEvaluators {
    evaluators: HashMap<ActionKind, Arc<dyn ActionDurationEvaluator>>,
}

impl DurationEvaluators {
    /// No evaluator at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute-based evaluators falling back to 1 for every action kind.
    pub fn new_bundle() -> Self {
        Self::from_config(&DurationConfig::default())
    }

    /// Attribute-based evaluators falling back to the configured defaults.
    pub fn from_config(config: &DurationConfig) -> Self {
        let mut dev = Self::new();
        for kind in ActionKind::ALL {
            if let Some(d) = config.get(kind) {
                let fallback = Arc::new(ConstantDuration(d));
                dev.register(kind, Arc::new(AttributeDuration::new(kind.attribute_key(), fallback)));
            }
        }
        dev
    }

    /// Registers an evaluator, returning the one it replaces.
    pub fn register(
        &mut self,
        kind: ActionKind,
        ev: Arc<dyn ActionDurationEvaluator>,
    ) -> Option<Arc<dyn ActionDurationEvaluator>> {
        self.evaluators.insert(kind, ev)
    }

    pub fn unregister(&mut self, kind: ActionKind) -> Option<Arc<dyn ActionDurationEvaluator>> {
        self.evaluators.remove(&kind)
    }

    pub fn is_registered(&self, kind: ActionKind) -> bool {
        self.evaluators.contains_key(&kind)
    }

    /// Evaluates the duration of an action.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ModelInconsistency`] when no evaluator is
    /// registered for the kind or when the estimate is negative.
    pub fn evaluate(&self, model: &Model, kind: ActionKind, e: Element) -> Result<i64> {
        let ev = self.evaluators.get(&kind).ok_or_else(|| {
            SchedulerError::inconsistency(format!("no duration evaluator for '{}'", kind))
        })?;
        let d = ev.evaluate(model, e);
        if d < 0 {
            return Err(SchedulerError::inconsistency(format!(
                "negative duration for '{}' on {}: {}",
                kind, e, d
            )));
        }
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmplan_core::{Node, Vm};

    #[test]
    fn test_missing_evaluator() {
        let dev = DurationEvaluators::new();
        let err = dev
            .evaluate(&Model::new(), ActionKind::BootNode, Node(0).into())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::ModelInconsistency(_)));
    }

    #[test]
    fn test_negative_duration() {
        let mut mo = Model::new();
        mo.attributes_mut().put(Vm(1), "shutdown", -3);
        let dev = DurationEvaluators::new_bundle();
        assert!(dev.evaluate(&mo, ActionKind::ShutdownVm, Vm(1).into()).is_err());
        assert_eq!(dev.evaluate(&mo, ActionKind::ShutdownVm, Vm(2).into()).unwrap(), 1);
    }

    #[test]
    fn test_closure_evaluator() {
        let mut dev = DurationEvaluators::new_bundle();
        dev.register(
            ActionKind::MigrateVm,
            Arc::new(FnDuration(|_: &Model, e: Element| 10 + e.id() as i64)),
        );
        let mo = Model::new();
        assert_eq!(dev.evaluate(&mo, ActionKind::MigrateVm, Vm(5).into()).unwrap(), 15);
    }

    #[test]
    fn test_from_config() {
        let config = DurationConfig {
            boot_node: 8,
            ..DurationConfig::default()
        };
        let dev = DurationEvaluators::from_config(&config);
        let mo = Model::new();
        assert_eq!(dev.evaluate(&mo, ActionKind::BootNode, Node(0).into()).unwrap(), 8);
        assert!(!dev.is_registered(ActionKind::ReinstantiateVm));
    }
}
