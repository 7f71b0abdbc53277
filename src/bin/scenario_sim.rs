//! JSON 场景仿真
//!
//! 读取 scenario.json，构建网络并运行到 horizon，输出汇总（可选 JSON）。

use clap::Parser;
use qnet_sim::error::Error;
use qnet_sim::net::EventLog;
use qnet_sim::sim::Simulator;
use qnet_sim::topo::scenario::{build_scenario, check_horizon, parse_scenario};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "scenario_sim", about = "Run scenario.json on the queueing network simulator")]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// Override the horizon from the scenario file
    #[arg(long)]
    horizon: Option<f64>,

    /// Override the seed from the scenario file
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Write every arrival/departure/drop record to this JSON file
    #[arg(long)]
    trace: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Error> {
    let override_horizon = args.horizon.map(check_horizon).transpose()?;
    let mut spec = parse_scenario(&fs::read_to_string(&args.scenario)?)?;
    if let Some(seed) = args.seed {
        spec.seed = Some(seed);
    }
    let mut scenario = build_scenario(&spec)?;
    let horizon = override_horizon.unwrap_or(scenario.horizon);
    let net = &mut scenario.network;
    if args.trace.is_some() {
        net.log = Some(EventLog::default());
    }

    let mut sim = Simulator::default();
    net.prime(&mut sim);
    let events = sim.run_until(horizon, net)?;
    info!(events, "仿真结束");

    let report = net.report(sim.now());
    if let (Some(path), Some(log)) = (&args.trace, &net.log) {
        fs::write(path, serde_json::to_string(log)?)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for st in &report.stations {
        println!(
            "{}: arrivals={}, departures={}, forwarded={}, lost={}, avg_users={:.4}, avg_delay={:.4}, utilization={:?}",
            st.name,
            st.arrivals.total(),
            st.departures.total(),
            st.forwarded.total(),
            st.lost.total(),
            st.avg_users,
            st.avg_delay,
            st.utilization
        );
    }
    println!(
        "done @ {}, created={}, completed={}, lost={}, transfers={}",
        sim.now(),
        report.stats.created,
        report.stats.completed,
        report.stats.lost,
        report.stats.transfers
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
