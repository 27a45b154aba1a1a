//! Tests for termination conditions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::*;

#[test]
fn test_backtrack_count_termination() {
    let mut monitor = SearchMonitor::start();
    let term = BacktrackCountTermination::new(3);

    assert!(!term.is_terminated(&monitor));
    monitor.backtracks = 2;
    assert!(!term.is_terminated(&monitor));
    monitor.backtracks = 3;
    assert!(term.is_terminated(&monitor));
}

#[test]
fn test_node_count_termination() {
    let mut monitor = SearchMonitor::start();
    let term = NodeCountTermination::new(10);
    monitor.nodes = 9;
    assert!(!term.is_terminated(&monitor));
    monitor.nodes = 10;
    assert!(term.is_terminated(&monitor));
}

#[test]
fn test_time_termination() {
    let monitor = SearchMonitor::start();
    assert!(TimeTermination::millis(0).is_terminated(&monitor));
    assert!(!TimeTermination::seconds(3600).is_terminated(&monitor));
}

#[test]
fn test_external_termination() {
    let flag = Arc::new(AtomicBool::new(false));
    let term = ExternalTermination::new(flag.clone());
    let monitor = SearchMonitor::start();

    assert!(!term.is_terminated(&monitor));
    flag.store(true, Ordering::SeqCst);
    assert!(term.is_terminated(&monitor));
}

#[test]
fn test_or_termination() {
    let mut monitor = SearchMonitor::start();
    let term = OrTermination::new()
        .with(NodeCountTermination::new(5))
        .with(BacktrackCountTermination::new(2));

    assert!(!term.is_terminated(&monitor));
    monitor.backtracks = 2;
    assert!(term.is_terminated(&monitor));

    assert!(!OrTermination::new().is_terminated(&monitor));
    assert!(!NoTermination.is_terminated(&monitor));
}
