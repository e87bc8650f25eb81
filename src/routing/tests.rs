//! End-to-end protocol scenarios: convergence, failure detection, and
//! recovery, driven through the full scheduler + transport stack.

use crate::dsl::SimBuilder;
use crate::event::EventType;
use crate::net::{NetRuntime, Topology};
use crate::packet::Address;
use crate::routing::{DistanceVectorApp, DvConfig, DV_ROUTING};
use crate::simulation::Simulation;
use crate::time::VirtualTime;

/// Shorter schedule than the defaults so scenario runs stay small.
fn quick_config(limit: u64) -> DvConfig {
    DvConfig {
        broadcast_interval: 30,
        broadcast_limit: limit,
        neighbor_timeout: 90,
    }
}

/// Process every event scheduled at or before tick `t`.
fn run_until(sim: &mut Simulation, rt: &mut NetRuntime, t: u64) {
    while sim
        .scheduler_mut()
        .peek_next()
        .map_or(false, |e| e.scheduled_at.ticks() <= t)
    {
        sim.step(rt);
    }
}

fn address_of(rt: &NetRuntime, hostname: &str) -> Address {
    rt.topology().node_by_hostname(hostname).unwrap().address()
}

fn app<'a>(rt: &'a NetRuntime, hostname: &str) -> &'a DistanceVectorApp {
    rt.protocol_at::<DistanceVectorApp>(hostname, DV_ROUTING)
        .unwrap()
}

// ── Convergence ───────────────────────────────────────────────────────

#[test]
fn test_two_node_exchange() {
    let (_, rt, _) = SimBuilder::new()
        .link("n1", "n2")
        .unwrap()
        .dv_all()
        .dv_config(quick_config(4))
        .run()
        .unwrap();

    let n1_addr = address_of(&rt, "n1");
    let n2_addr = address_of(&rt, "n2");

    let n1 = app(&rt, "n1");
    let distances = n1.table().export_distances();
    assert_eq!(distances.len(), 2);
    assert_eq!(distances[&n1_addr], 0);
    assert_eq!(distances[&n2_addr], 1);

    let n2 = app(&rt, "n2");
    let distances = n2.table().export_distances();
    assert_eq!(distances[&n2_addr], 0);
    assert_eq!(distances[&n1_addr], 1);

    // Forwarding points at the direct link; the self entry is absent.
    let n1_node = rt.topology().node_by_hostname("n1").unwrap();
    assert_eq!(
        n1_node.forward_lookup(n2_addr),
        rt.topology().link_between("n1", "n2")
    );
    assert_eq!(n1_node.forward_lookup(n1_addr), None);
}

#[test]
fn test_three_node_chain_converges() {
    let (_, rt, _) = SimBuilder::new()
        .link("n1", "n2")
        .unwrap()
        .link("n2", "n3")
        .unwrap()
        .dv_all()
        .dv_config(quick_config(6))
        .run()
        .unwrap();

    let n1_addr = address_of(&rt, "n1");
    let n2_addr = address_of(&rt, "n2");
    let n3_addr = address_of(&rt, "n3");

    // n1 and n3 are not directly linked; traffic goes via n2.
    let n1 = app(&rt, "n1");
    let distances = n1.table().export_distances();
    assert_eq!(distances[&n1_addr], 0);
    assert_eq!(distances[&n2_addr], 1);
    assert_eq!(distances[&n3_addr], 2);

    let to_n3 = n1.table().entry(n3_addr).unwrap();
    assert_eq!(to_n3.next_hop, rt.topology().link_between("n1", "n2"));

    // The middle node sees both ends one hop away.
    let n2 = app(&rt, "n2");
    assert_eq!(n2.table().export_distances()[&n1_addr], 1);
    assert_eq!(n2.table().export_distances()[&n3_addr], 1);
}

#[test]
fn test_self_route_invariant_holds_throughout() {
    let (mut sim, mut rt) = SimBuilder::new()
        .link("n1", "n2")
        .unwrap()
        .link("n2", "n3")
        .unwrap()
        .dv_all()
        .dv_config(quick_config(6))
        .build()
        .unwrap();

    // Check after every single event, for the whole run.
    while sim.step(&mut rt).is_some() {
        for host in ["n1", "n2", "n3"] {
            let addr = address_of(&rt, host);
            if let Some(entry) = app(&rt, host).table().entry(addr) {
                assert_eq!(entry.cost, 0, "{} self cost drifted", host);
                assert!(entry.next_hop.is_none(), "{} self entry grew a next hop", host);
            }
        }
    }
}

// ── Failure detection ─────────────────────────────────────────────────

#[test]
fn test_neighbor_timeout_evicts_routes() {
    // n2 reaches n4 only through n3. A quiet side branch (n1) keeps
    // advertising toward n2, but n2's own advertisements to n1 are
    // suppressed from the start, so n1 never learns any routes and
    // cannot echo them back. Severing n2-n3 must therefore make n4
    // vanish from n2's tables once n3 times out.
    let (mut sim, mut rt) = SimBuilder::new()
        .link("n1", "n2")
        .unwrap()
        .link("n2", "n3")
        .unwrap()
        .link("n3", "n4")
        .unwrap()
        .dv_all()
        .dv_config(quick_config(12))
        .sever("n2", "n3", 70)
        .unwrap()
        .build()
        .unwrap();

    // One-way quiet branch: n2 -> n1 stays down for the whole run.
    let to_n1 = rt.topology().link_between("n2", "n1").unwrap();
    sim.schedule(VirtualTime::ZERO, EventType::LinkSet { link: to_n1, up: false });

    let n3_addr = address_of(&rt, "n3");
    let n4_addr = address_of(&rt, "n4");

    // Before the severance n2 has a route to n4 via n3.
    run_until(&mut sim, &mut rt, 65);
    {
        let n2 = app(&rt, "n2");
        assert_eq!(n2.table().export_distances()[&n4_addr], 2);
        assert_eq!(
            n2.table().entry(n4_addr).unwrap().next_hop,
            rt.topology().link_between("n2", "n3")
        );
    }

    // n3's last advertisement reached n2 at T=61. The next n1 receipt
    // at or after T=151 triggers the lazy sweep.
    run_until(&mut sim, &mut rt, 150);
    assert!(app(&rt, "n2").table().entry(n4_addr).is_some());

    sim.run(&mut rt);

    let n2 = app(&rt, "n2");
    assert!(n2.liveness().last_contact("n3").is_none());
    assert!(n2.table().entry(n3_addr).is_none());
    assert!(n2.table().entry(n4_addr).is_none());

    // The forwarding table was rebuilt without the dead branch.
    let n2_node = rt.topology().node_by_hostname("n2").unwrap();
    assert_eq!(n2_node.forward_lookup(n4_addr), None);
    assert_eq!(n2_node.forward_lookup(n3_addr), None);
}

#[test]
fn test_routes_echo_back_without_split_horizon() {
    // There is no split horizon: after n1-n2 loses its far side, the
    // echo of n3 through n1's own advertisements keeps a (climbing)
    // route to n3 alive at n2 instead of letting it disappear.
    let (_, rt, _) = SimBuilder::new()
        .link("n1", "n2")
        .unwrap()
        .link("n2", "n3")
        .unwrap()
        .dv_all()
        .dv_config(quick_config(12))
        .sever("n2", "n3", 70)
        .unwrap()
        .run()
        .unwrap();

    let n3_addr = address_of(&rt, "n3");
    let n2 = app(&rt, "n2");

    // n3 was evicted from the neighbor cache, yet a stale route
    // via n1 survives at an inflated cost.
    assert!(n2.liveness().last_contact("n3").is_none());
    let entry = n2.table().entry(n3_addr).unwrap();
    assert!(entry.cost > 1, "echoed route should cost more than the dead direct one");
    assert_eq!(entry.next_hop, rt.topology().link_between("n2", "n1"));
}

// ── Recovery ──────────────────────────────────────────────────────────

#[test]
fn test_link_recovery_reconverges() {
    let (_, rt, _) = SimBuilder::new()
        .link("n1", "n2")
        .unwrap()
        .link("n2", "n3")
        .unwrap()
        .dv_all()
        .dv_config(quick_config(20))
        .sever("n2", "n3", 70)
        .unwrap()
        .restore("n2", "n3", 300)
        .unwrap()
        .run()
        .unwrap();

    let n1_addr = address_of(&rt, "n1");
    let n2_addr = address_of(&rt, "n2");
    let n3_addr = address_of(&rt, "n3");

    // Several exchange rounds after the restore, everything is back
    // to shortest paths.
    for (host, expected) in [
        ("n1", vec![(n1_addr, 0), (n2_addr, 1), (n3_addr, 2)]),
        ("n2", vec![(n1_addr, 1), (n2_addr, 0), (n3_addr, 1)]),
        ("n3", vec![(n1_addr, 2), (n2_addr, 1), (n3_addr, 0)]),
    ] {
        let distances = app(&rt, host).table().export_distances();
        for (addr, cost) in expected {
            assert_eq!(distances[&addr], cost, "{} distance to {}", host, addr);
        }
    }

    // n2 forwards to n3 over the restored direct link again.
    let n2 = app(&rt, "n2");
    assert_eq!(
        n2.table().entry(n3_addr).unwrap().next_hop,
        rt.topology().link_between("n2", "n3")
    );
}

// ── Termination ───────────────────────────────────────────────────────

#[test]
fn test_broadcast_counter_exhaustion_terminates() {
    let (sim, rt, _) = SimBuilder::new()
        .link("n1", "n2")
        .unwrap()
        .dv_all()
        .dv_config(quick_config(2))
        .run()
        .unwrap();

    // Broadcasts at T=0, 30, 60; the final deliveries land at T=61
    // and nothing re-arms afterwards.
    assert!(sim.is_finished());
    assert_eq!(sim.current_time(), VirtualTime::new(61));
    assert_eq!(app(&rt, "n1").broadcast_count(), 2);
    assert_eq!(app(&rt, "n2").broadcast_count(), 2);

    // Terminated nodes still consumed advertisements to the end.
    assert!(rt.delivered_count() > 0);
}

// ── Fault-injection hook ──────────────────────────────────────────────

#[test]
fn test_broadcast_hook_can_drop_links() {
    let mut topology = Topology::new();
    topology.connect("n1", "n2", 1).unwrap();
    let n1 = topology.resolve("n1").unwrap();
    let n2 = topology.resolve("n2").unwrap();
    let out_link = topology.link_between("n1", "n2").unwrap();

    let mut sim = Simulation::new();
    let mut rt = NetRuntime::new(topology);

    // n1's harness hook lowers its outgoing link once the first
    // broadcast has been counted.
    let hooked = DistanceVectorApp::new(quick_config(4)).with_broadcast_hook(Box::new(
        move |count, ctx| {
            if count == 1 {
                ctx.set_link_at(out_link, false, 0);
            }
        },
    ));
    rt.register_protocol(n1, DV_ROUTING, Box::new(hooked)).unwrap();
    rt.register_protocol(
        n2,
        DV_ROUTING,
        Box::new(DistanceVectorApp::new(quick_config(4))),
    )
    .unwrap();

    for node in [n1, n2] {
        sim.schedule(
            VirtualTime::ZERO,
            EventType::ProtocolTimer {
                node,
                protocol: DV_ROUTING,
                timer_id: 0,
            },
        );
    }
    sim.run(&mut rt);

    // The hook took effect through the ordinary event path.
    assert!(!rt.topology().link(out_link).unwrap().is_up());

    // Only n1's very first (empty) advertisement crossed, so n2 never
    // learned a route to n1.
    let n2_app = rt.protocol::<DistanceVectorApp>(n2, DV_ROUTING).unwrap();
    assert_eq!(n2_app.table().len(), 1);

    // n1 kept hearing n2 the whole time.
    let n1_app = rt.protocol::<DistanceVectorApp>(n1, DV_ROUTING).unwrap();
    assert_eq!(n1_app.table().len(), 2);
}
