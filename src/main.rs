use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use polaris::routing::app::{
    DEFAULT_BROADCAST_INTERVAL, DEFAULT_BROADCAST_LIMIT, DEFAULT_NEIGHBOR_TIMEOUT,
};
use polaris::{Address, DistanceVectorApp, DvConfig, SimBuilder, DV_ROUTING};

/// Built-in demo topology, used when no file is given.
const FIVE_NODES: &str = include_str!("../demos/five-nodes.txt");

#[derive(Parser)]
#[command(
    name = "polaris",
    version,
    about = "Deterministic distance-vector routing simulator"
)]
struct Args {
    /// Topology description file; defaults to a built-in five-node chain.
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Ticks between periodic advertisements.
    #[arg(long, default_value_t = DEFAULT_BROADCAST_INTERVAL)]
    interval: u64,

    /// Number of re-armed broadcasts per node after the initial one.
    #[arg(long, default_value_t = DEFAULT_BROADCAST_LIMIT)]
    limit: u64,

    /// Neighbor silence threshold in ticks.
    #[arg(long, default_value_t = DEFAULT_NEIGHBOR_TIMEOUT)]
    timeout: u64,

    /// Sever both directions of a link: "<host>:<host>:<tick>".
    /// May be given multiple times.
    #[arg(long, value_name = "A:B:TICK")]
    sever: Vec<String>,

    /// Restore both directions of a link: "<host>:<host>:<tick>".
    /// May be given multiple times.
    #[arg(long, value_name = "A:B:TICK")]
    restore: Vec<String>,
}

fn parse_toggle(spec: &str) -> anyhow::Result<(&str, &str, u64)> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        [a, b, tick] => {
            let tick = tick
                .parse::<u64>()
                .with_context(|| format!("invalid tick in {:?}", spec))?;
            Ok((a, b, tick))
        }
        _ => anyhow::bail!("expected '<host>:<host>:<tick>', got {:?}", spec),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let text = match &args.topology {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("cannot read topology {}", path.display()))?,
        None => FIVE_NODES.to_string(),
    };

    let mut builder = SimBuilder::from_topology_text(&text)?
        .dv_all()
        .dv_config(DvConfig {
            broadcast_interval: args.interval,
            broadcast_limit: args.limit,
            neighbor_timeout: args.timeout,
        });
    for spec in &args.sever {
        let (a, b, tick) = parse_toggle(spec)?;
        builder = builder.sever(a, b, tick)?;
    }
    for spec in &args.restore {
        let (a, b, tick) = parse_toggle(spec)?;
        builder = builder.restore(a, b, tick)?;
    }

    let (sim, rt, processed) = builder.run()?;

    println!("═══════════════════════════════════════════════════════");
    println!("  Polaris — Distance-Vector Routing Simulation");
    println!("═══════════════════════════════════════════════════════");
    println!();
    println!(
        "  {} hosts, {} directed links",
        rt.topology().host_count(),
        rt.topology().link_count()
    );
    println!(
        "  {} events processed, finished at {}",
        processed,
        sim.current_time()
    );
    println!(
        "  transport: {} delivered, {} dropped",
        rt.delivered_count(),
        rt.dropped_count()
    );
    println!();

    // Map addresses back to hostnames for readable tables.
    let names: BTreeMap<Address, String> = rt
        .topology()
        .hostnames()
        .into_iter()
        .filter_map(|h| {
            let addr = rt.topology().node_by_hostname(&h)?.address();
            Some((addr, h))
        })
        .collect();

    for hostname in rt.topology().hostnames() {
        let Some(app) = rt.protocol_at::<DistanceVectorApp>(&hostname, DV_ROUTING) else {
            continue;
        };
        println!("  {} (sent {} broadcasts):", hostname, app.broadcast_count() + 1);
        let node = rt
            .topology()
            .node_by_hostname(&hostname)
            .expect("hostname from the topology's own index");
        for (addr, cost) in app.table().export_distances() {
            let via = app
                .table()
                .entry(addr)
                .and_then(|e| e.next_hop)
                .map(|link| format!(" via {}", link))
                .unwrap_or_default();
            let name = names.get(&addr).map(String::as_str).unwrap_or("?");
            println!("    {:<8} cost {:>2}{}", name, cost, via);
        }
        if app.table().is_empty() {
            println!("    (no routes learned)");
        }
        println!("    forwarding entries: {}", node.forwarding_table().len());
        println!();
    }

    Ok(())
}
