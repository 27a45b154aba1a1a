//! Tests for the datacenter model.

use super::*;

fn two_nodes() -> (Model, Node, Node) {
    let mut mo = Model::new();
    let n1 = mo.new_node();
    let n2 = mo.new_node();
    mo.mapping_mut().add_online_node(n1);
    mo.mapping_mut().add_online_node(n2);
    (mo, n1, n2)
}

#[test]
fn test_vm_is_in_one_place() {
    let (mut mo, n1, n2) = two_nodes();
    let v = mo.new_vm();
    let map = mo.mapping_mut();
    assert!(map.add_running_vm(v, n1));
    assert!(map.add_sleeping_vm(v, n2));

    assert_eq!(map.running_vms_on(n1).count(), 0);
    assert_eq!(map.sleeping_vms_on(n2).collect::<Vec<_>>(), vec![v]);
    assert_eq!(map.vm_state(v), Some(VmState::Sleeping));

    assert!(map.add_ready_vm(v));
    assert_eq!(map.vm_location(v), None);
    assert_eq!(map.sleeping_vms_on(n2).count(), 0);
}

#[test]
fn test_offline_node_hosts_nothing() {
    let (mut mo, n1, _) = two_nodes();
    let v = mo.new_vm();
    let map = mo.mapping_mut();
    map.add_running_vm(v, n1);
    assert!(!map.add_offline_node(n1));
    assert!(map.is_online(n1));

    map.remove_vm(v);
    assert!(map.add_offline_node(n1));
    assert!(!map.add_running_vm(v, n1));
    assert_eq!(map.node_state(n1), Some(NodeState::Offline));
}

#[test]
fn test_iteration_is_ordered() {
    let mut map = Mapping::new();
    for id in [4, 1, 3] {
        map.add_online_node(Node(id));
    }
    map.add_offline_node(Node(2));
    assert_eq!(map.all_nodes(), vec![Node(1), Node(2), Node(3), Node(4)]);

    map.add_ready_vm(Vm(9));
    map.add_running_vm(Vm(5), Node(1));
    map.add_running_vm(Vm(7), Node(3));
    assert_eq!(map.all_vms().collect::<Vec<_>>(), vec![Vm(5), Vm(7), Vm(9)]);
    assert_eq!(map.running_vms().collect::<Vec<_>>(), vec![Vm(5), Vm(7)]);
}

#[test]
fn test_id_counters() {
    let mut mo = Model::new();
    mo.register_vm(Vm(10));
    assert_eq!(mo.new_vm(), Vm(11));
    mo.register_vm(Vm(5));
    assert_eq!(mo.next_vm_id(), 12);
    mo.register_node(Node(3));
    assert_eq!(mo.new_node(), Node(4));
}

#[test]
fn test_sub_model() {
    let (mut mo, n1, n2) = two_nodes();
    let (v1, v2, v3) = (mo.new_vm(), mo.new_vm(), mo.new_vm());
    mo.mapping_mut().add_running_vm(v1, n1);
    mo.mapping_mut().add_sleeping_vm(v2, n2);
    mo.mapping_mut().add_ready_vm(v3);
    mo.attributes_mut().put(v1, "migrate", 4);
    mo.attributes_mut().put(v2, "resume", 2);
    let mut cpu = ShareableResource::new("cpu", 4, 1);
    cpu.set_capacity(n1, 8).set_consumption(v1, 3).set_consumption(v2, 2);
    mo.add_resource(cpu);

    let sub = mo.sub_model(&[n1].into_iter().collect(), &[v3]);
    assert_eq!(sub.mapping().all_nodes(), vec![n1]);
    assert!(sub.mapping().is_running(v1));
    assert!(sub.mapping().is_ready(v3));
    assert!(!sub.mapping().contains_vm(v2));
    assert_eq!(sub.attributes().get_int(v1, "migrate"), Some(4));
    assert!(!sub.attributes().is_set(v2, "resume"));

    let cpu = sub.resource("cpu").unwrap();
    assert_eq!(cpu.capacity(n1), 8);
    assert_eq!(cpu.consumption(v1), 3);
    // v2 is not part of the sub-model: back to the default
    assert_eq!(cpu.consumption(v2), 1);
    assert_eq!(sub.next_vm_id(), mo.next_vm_id());
}
