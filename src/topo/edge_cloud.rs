//! 边缘/云两级拓扑构建
//!
//! 拓扑结构：micro --(溢出, 所有类型)--> cloud
//!                 --(服务完成, B 类)--> cloud
//!
//! A 类客户在边缘数据中心完成处理；B 类客户还需要在云端继续处理。
//! 边缘站点满员时，客户不经处理直接转发到云端。

use super::scenario::check_horizon;
use crate::error::{ConfigError, Error};
use crate::net::{ClientType, Event, Network, OutcomeKind, StationId};
use crate::queue::{ArrivalProcess, Capacity, ServerCount, ServiceDistribution, StationConfig};
use crate::sim::{SimTime, Simulator};
use tracing::info;

/// 边缘/云拓扑配置选项
#[derive(Debug, Clone)]
pub struct EdgeCloudOpts {
    pub arrival_rate: f64,
    pub fraction_b: f64,
    pub micro_rate: f64,
    pub micro_capacity: usize,
    pub micro_servers: usize,
    pub cloud_rate: f64,
    pub cloud_capacity: usize,
    pub cloud_servers: usize,
    /// B 类客户从边缘到云端的传输时延
    pub tx_delay: f64,
    /// 溢出客户转发到云端的时延
    pub overflow_delay: f64,
    pub distribution: ServiceDistribution,
}

impl Default for EdgeCloudOpts {
    fn default() -> Self {
        Self {
            arrival_rate: 0.1,
            fraction_b: 0.5,
            micro_rate: 1.0 / 3.0,
            micro_capacity: 10,
            micro_servers: 1,
            cloud_rate: 1.0 / 5.0,
            cloud_capacity: 20,
            cloud_servers: 1,
            tx_delay: 0.5,
            overflow_delay: 0.2,
            distribution: ServiceDistribution::Constant,
        }
    }
}

/// 构建好的边缘/云拓扑
#[derive(Debug, Clone, Copy)]
pub struct EdgeCloud {
    pub micro: StationId,
    pub cloud: StationId,
}

pub fn build_edge_cloud(net: &mut Network, opts: &EdgeCloudOpts) -> Result<EdgeCloud, ConfigError> {
    let micro = net.add_station(StationConfig {
        capacity: Capacity::Finite(opts.micro_capacity),
        servers: ServerCount::Finite(opts.micro_servers),
        service_rates: vec![opts.micro_rate],
        distribution: opts.distribution,
        arrival: Some(ArrivalProcess {
            rate: opts.arrival_rate,
            fraction_b: opts.fraction_b,
        }),
        ..StationConfig::new("micro")
    })?;
    let cloud = net.add_station(StationConfig {
        capacity: Capacity::Finite(opts.cloud_capacity),
        servers: ServerCount::Finite(opts.cloud_servers),
        service_rates: vec![opts.cloud_rate],
        distribution: opts.distribution,
        ..StationConfig::new("cloud")
    })?;

    net.add_route(micro, OutcomeKind::Overflow, None, cloud, opts.overflow_delay)?;
    net.add_route(
        micro,
        OutcomeKind::Departure,
        Some(ClientType::B),
        cloud,
        opts.tx_delay,
    )?;
    Ok(EdgeCloud { micro, cloud })
}

/// 分阶段运行：每个阶段开始时把 `station` 的到达率设为对应值，再运行 `phase_len`。
///
/// 返回最后一个阶段结束的时刻。
pub fn run_phases(
    net: &mut Network,
    sim: &mut Simulator<Event>,
    station: StationId,
    rates: &[f64],
    phase_len: f64,
) -> Result<SimTime, Error> {
    check_horizon(phase_len)?;
    let mut until = sim.now();
    for (i, &rate) in rates.iter().enumerate() {
        net.set_arrival_rate(station, rate, sim)?;
        until = until.after(phase_len);
        info!(phase = i, rate, until = %until, "开始新阶段");
        sim.run_until(until, net)?;
    }
    Ok(until)
}
