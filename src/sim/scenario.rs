//! JSON 场景描述
//!
//! 描述一个排队网络实验：若干站点、可选的外部到达过程以及站点之间的路由。
//! 这里只负责反序列化，校验与构建在 `topo::scenario` 中完成。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    /// 仿真时间上限
    pub horizon: f64,
    pub stations: Vec<StationSpec>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSpec {
    pub name: String,
    /// 站点容量（排队 + 服务中的客户数）；缺省或 null 表示无限
    #[serde(default)]
    pub capacity: Option<usize>,
    /// 服务器数量；缺省或 null 表示无限
    #[serde(default)]
    pub servers: Option<usize>,
    /// 服务率：一个值表示所有服务器相同，否则每台服务器一个值
    pub service_rates: Vec<f64>,
    /// 每台服务器每次服务的成本；缺省时成本等于服务率
    #[serde(default)]
    pub service_costs: Option<Vec<f64>>,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
    #[serde(default)]
    pub arrival: Option<ArrivalSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalSpec {
    pub rate: f64,
    /// B 类客户所占比例
    #[serde(default)]
    pub fraction_b: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub from: String,
    /// "departure" 或 "overflow"
    pub outcome: String,
    /// 只对某一类客户生效；缺省表示所有类型
    #[serde(default)]
    pub client_type: Option<String>,
    pub to: String,
    #[serde(default)]
    pub delay: f64,
}
