//! 单站点拓扑构建

use crate::error::ConfigError;
use crate::net::{Network, StationId};
use crate::queue::{
    AllocationPolicy, ArrivalProcess, Capacity, ServerCount, ServiceDistribution, StationConfig,
};

/// 单站点配置选项（M/G/s/B）
#[derive(Debug, Clone)]
pub struct SingleStationOpts {
    pub arrival_rate: f64,
    pub fraction_b: f64,
    pub service_rates: Vec<f64>,
    pub servers: ServerCount,
    pub capacity: Capacity,
    pub policy: AllocationPolicy,
    pub distribution: ServiceDistribution,
}

impl Default for SingleStationOpts {
    fn default() -> Self {
        Self {
            arrival_rate: 0.5,
            fraction_b: 0.0,
            service_rates: vec![1.0],
            servers: ServerCount::Finite(1),
            capacity: Capacity::Unbounded,
            policy: AllocationPolicy::FirstIdle,
            distribution: ServiceDistribution::Exponential,
        }
    }
}

/// 构建只有一个站点的网络
///
/// 客户服务完成后直接离开网络，被拒绝的客户永久丢失。
pub fn build_single_station(
    net: &mut Network,
    opts: &SingleStationOpts,
) -> Result<StationId, ConfigError> {
    net.add_station(StationConfig {
        capacity: opts.capacity,
        servers: opts.servers,
        service_rates: opts.service_rates.clone(),
        policy: opts.policy,
        distribution: opts.distribution,
        arrival: Some(ArrivalProcess {
            rate: opts.arrival_rate,
            fraction_b: opts.fraction_b,
        }),
        ..StationConfig::new("station")
    })
}
