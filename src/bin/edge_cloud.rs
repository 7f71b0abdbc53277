//! 边缘/云仿真
//!
//! 边缘数据中心满员时溢出到云端，B 类客户在边缘处理后还要到云端继续处理。

use clap::Parser;
use qnet_sim::error::Error;
use qnet_sim::net::Network;
use qnet_sim::queue::ServiceDistribution;
use qnet_sim::sim::Simulator;
use qnet_sim::topo::edge_cloud::{EdgeCloudOpts, build_edge_cloud, run_phases};
use qnet_sim::topo::scenario::check_horizon;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "edge_cloud", about = "边缘/云两级排队仿真：溢出 + B 类继续处理")]
struct Args {
    #[arg(long, default_value_t = 0.1)]
    arrival_rate: f64,
    #[arg(long, default_value_t = 0.5)]
    fraction_b: f64,
    #[arg(long, default_value_t = 1.0 / 3.0)]
    micro_rate: f64,
    #[arg(long, default_value_t = 10)]
    micro_capacity: usize,
    #[arg(long, default_value_t = 1)]
    micro_servers: usize,
    #[arg(long, default_value_t = 0.2)]
    cloud_rate: f64,
    #[arg(long, default_value_t = 20)]
    cloud_capacity: usize,
    #[arg(long, default_value_t = 1)]
    cloud_servers: usize,
    /// 边缘到云端的传输时延
    #[arg(long, default_value_t = 0.5)]
    tx_delay: f64,
    /// 溢出转发时延
    #[arg(long, default_value_t = 0.2)]
    overflow_delay: f64,
    #[arg(long, default_value = "constant")]
    distribution: String,
    /// 每个阶段的到达率，逗号分隔；依次运行，每阶段 `horizon` 时长
    #[arg(long, value_delimiter = ',')]
    phases: Vec<f64>,
    #[arg(long, default_value_t = 10_000.0)]
    horizon: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn run(args: Args) -> Result<(), Error> {
    check_horizon(args.horizon)?;
    let opts = EdgeCloudOpts {
        arrival_rate: args.arrival_rate,
        fraction_b: args.fraction_b,
        micro_rate: args.micro_rate,
        micro_capacity: args.micro_capacity,
        micro_servers: args.micro_servers,
        cloud_rate: args.cloud_rate,
        cloud_capacity: args.cloud_capacity,
        cloud_servers: args.cloud_servers,
        tx_delay: args.tx_delay,
        overflow_delay: args.overflow_delay,
        distribution: args.distribution.parse::<ServiceDistribution>()?,
    };

    let mut sim = Simulator::default();
    let mut net = Network::new(args.seed);
    let topo = build_edge_cloud(&mut net, &opts)?;
    net.prime(&mut sim);

    let phases = if args.phases.is_empty() {
        vec![opts.arrival_rate]
    } else {
        args.phases
    };
    run_phases(&mut net, &mut sim, topo.micro, &phases, args.horizon)?;

    let report = net.report(sim.now());
    for st in &report.stations {
        println!(
            "{}: arrivals={}, departures={}, forwarded={}, lost={}, avg_users={:.4}, avg_delay={:.4}",
            st.name,
            st.arrivals.total(),
            st.departures.total(),
            st.forwarded.total(),
            st.lost.total(),
            st.avg_users,
            st.avg_delay
        );
    }
    println!(
        "done @ {}, created={}, completed={}, lost={}, avg_end_to_end_delay={:.4}",
        sim.now(),
        report.stats.created,
        report.stats.completed,
        report.stats.lost,
        report.avg_end_to_end_delay
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
