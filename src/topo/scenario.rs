//! JSON 场景构建
//!
//! 把 `ScenarioSpec` 校验并转换成 `Network`。所有名字（策略、分布、
//! 路由结果、客户类型、站点）都在这里解析，失败时返回 `ConfigError`。

use crate::error::ConfigError;
use crate::net::{ClientType, Network, OutcomeKind};
use crate::queue::{
    AllocationPolicy, ArrivalProcess, Capacity, ServerCount, ServiceDistribution, StationConfig,
};
use crate::sim::{ScenarioSpec, SimTime, StationSpec};
use tracing::info;

/// 当前支持的场景格式版本
pub const SCHEMA_VERSION: u32 = 1;

/// 构建好的场景：网络 + 仿真时间上限
pub struct Scenario {
    pub network: Network,
    pub horizon: SimTime,
}

/// 解析 JSON 文本
pub fn parse_scenario(raw: &str) -> Result<ScenarioSpec, ConfigError> {
    let spec: ScenarioSpec = serde_json::from_str(raw)?;
    Ok(spec)
}

/// 解析 JSON 文本并构建网络
pub fn load_scenario(raw: &str) -> Result<Scenario, ConfigError> {
    build_scenario(&parse_scenario(raw)?)
}

pub fn build_scenario(spec: &ScenarioSpec) -> Result<Scenario, ConfigError> {
    if spec.schema_version != SCHEMA_VERSION {
        return Err(ConfigError::UnsupportedSchema(spec.schema_version));
    }
    let horizon = check_horizon(spec.horizon)?;

    let mut network = Network::new(spec.seed.unwrap_or(0));
    for st in &spec.stations {
        network.add_station(station_config(st)?)?;
    }

    for r in &spec.routes {
        let from = network
            .station_id(&r.from)
            .ok_or_else(|| ConfigError::UnknownStation(r.from.clone()))?;
        let to = network
            .station_id(&r.to)
            .ok_or_else(|| ConfigError::UnknownStation(r.to.clone()))?;
        let kind: OutcomeKind = r.outcome.parse()?;
        let client_type = r
            .client_type
            .as_deref()
            .map(str::parse::<ClientType>)
            .transpose()?;
        network.add_route(from, kind, client_type, to, r.delay)?;
    }

    info!(
        stations = spec.stations.len(),
        routes = spec.routes.len(),
        horizon = spec.horizon,
        seed = ?spec.seed,
        "✅ 场景构建完成"
    );
    Ok(Scenario {
        network,
        horizon,
    })
}

/// 仿真时间上限必须是有限的非负数，否则带外部到达的网络永远跑不完
pub fn check_horizon(horizon: f64) -> Result<SimTime, ConfigError> {
    if horizon.is_finite() && horizon >= 0.0 {
        Ok(SimTime(horizon))
    } else {
        Err(ConfigError::InvalidHorizon(horizon))
    }
}

fn station_config(st: &StationSpec) -> Result<StationConfig, ConfigError> {
    let policy = match &st.policy {
        Some(p) => p.parse::<AllocationPolicy>()?,
        None => AllocationPolicy::default(),
    };
    let distribution = match &st.distribution {
        Some(d) => d.parse::<ServiceDistribution>()?,
        None => ServiceDistribution::default(),
    };
    Ok(StationConfig {
        name: st.name.clone(),
        capacity: Capacity::from(st.capacity),
        servers: ServerCount::from(st.servers),
        service_rates: st.service_rates.clone(),
        service_costs: st.service_costs.clone(),
        policy,
        distribution,
        arrival: st.arrival.as_ref().map(|a| ArrivalProcess {
            rate: a.rate,
            fraction_b: a.fraction_b,
        }),
    })
}
