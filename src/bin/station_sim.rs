//! 单站点仿真
//!
//! 运行一个 M/G/s/B 站点，输出到达率、平均客户数、平均时延与拒绝概率。

use clap::Parser;
use qnet_sim::error::Error;
use qnet_sim::net::Network;
use qnet_sim::queue::{AllocationPolicy, Capacity, ServerCount, ServiceDistribution};
use qnet_sim::sim::Simulator;
use qnet_sim::topo::scenario::check_horizon;
use qnet_sim::topo::single::{SingleStationOpts, build_single_station};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "station_sim", about = "单站点排队仿真：M/G/s/B")]
struct Args {
    /// 外部到达率 λ
    #[arg(long, default_value_t = 0.5)]
    arrival_rate: f64,
    /// B 类客户比例
    #[arg(long, default_value_t = 0.0)]
    fraction_b: f64,
    /// 服务率，逗号分隔；一个值表示所有服务器相同
    #[arg(long, value_delimiter = ',', default_value = "1.0")]
    service_rates: Vec<f64>,
    #[arg(long, default_value_t = 1)]
    servers: usize,
    /// 无限服务器（忽略 --servers 与 --capacity）
    #[arg(long)]
    unbounded_servers: bool,
    /// 站点容量；不指定表示无限
    #[arg(long)]
    capacity: Option<usize>,
    /// first_idle / round_robin / faster_first
    #[arg(long, default_value = "first_idle")]
    policy: String,
    /// exponential / constant / uniform
    #[arg(long, default_value = "exponential")]
    distribution: String,
    #[arg(long, default_value_t = 10_000.0)]
    horizon: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// 以 JSON 输出汇总
    #[arg(long)]
    json: bool,
}

fn run(args: Args) -> Result<(), Error> {
    let horizon = check_horizon(args.horizon)?;
    let opts = SingleStationOpts {
        arrival_rate: args.arrival_rate,
        fraction_b: args.fraction_b,
        service_rates: args.service_rates,
        servers: if args.unbounded_servers {
            ServerCount::Unbounded
        } else {
            ServerCount::Finite(args.servers)
        },
        capacity: Capacity::from(args.capacity),
        policy: args.policy.parse::<AllocationPolicy>()?,
        distribution: args.distribution.parse::<ServiceDistribution>()?,
    };

    let mut sim = Simulator::default();
    let mut net = Network::new(args.seed);
    build_single_station(&mut net, &opts)?;
    net.prime(&mut sim);
    sim.run_until(horizon, &mut net)?;

    let report = net.report(sim.now());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for st in &report.stations {
        println!(
            "done @ {}, arrivals={}, departures={}, avg_users={:.4}, avg_delay={:.4}, rejection={:.4}",
            sim.now(),
            st.arrivals.total(),
            st.departures.total(),
            st.avg_users,
            st.avg_delay,
            st.rejection_probability
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    // 初始化 tracing
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
