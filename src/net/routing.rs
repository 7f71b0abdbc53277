//! 站点间路由
//!
//! 站点本身不认识其他站点：客户离开或被拒绝后去哪里、经过多少时延，
//! 都由网络持有的 `RoutingPolicy` 决定。默认实现是一张静态路由表：
//! (源站点, 结果) -> (目标站点, 时延)，结果区分正常离开与容量溢出，并可按客户类型细分。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::client::ClientType;
use super::id::StationId;
use crate::error::ConfigError;

/// 客户在一个站点上的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// 服务完成后离开
    Departure(ClientType),
    /// 因容量已满被拒绝
    Overflow(ClientType),
}

impl Outcome {
    pub fn client_type(self) -> ClientType {
        match self {
            Outcome::Departure(t) | Outcome::Overflow(t) => t,
        }
    }

    fn kind(self) -> OutcomeKind {
        match self {
            Outcome::Departure(_) => OutcomeKind::Departure,
            Outcome::Overflow(_) => OutcomeKind::Overflow,
        }
    }
}

/// 不带客户类型的结果种类（用于配置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Departure,
    Overflow,
}

impl OutcomeKind {
    pub fn with_type(self, client_type: ClientType) -> Outcome {
        match self {
            OutcomeKind::Departure => Outcome::Departure(client_type),
            OutcomeKind::Overflow => Outcome::Overflow(client_type),
        }
    }
}

impl FromStr for OutcomeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "departure" => Ok(OutcomeKind::Departure),
            "overflow" => Ok(OutcomeKind::Overflow),
            other => Err(ConfigError::UnknownOutcome(other.to_string())),
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Departure => f.write_str("departure"),
            OutcomeKind::Overflow => f.write_str("overflow"),
        }
    }
}

/// 转发目标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub target: StationId,
    pub delay: f64,
}

/// 路由策略：决定某个结果之后客户去往哪个站点（None 表示离开网络或丢失）。
pub trait RoutingPolicy: fmt::Debug {
    fn route(&self, from: StationId, outcome: Outcome) -> Option<Route>;
}

/// 静态路由表
#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    /// 按类型精确匹配的条目
    by_type: HashMap<(StationId, Outcome), Route>,
    /// 对所有类型生效的条目
    any_type: HashMap<(StationId, OutcomeKind), Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条路由；`client_type` 为 None 时对所有类型生效。返回被替换的旧条目。
    pub fn insert(
        &mut self,
        from: StationId,
        kind: OutcomeKind,
        client_type: Option<ClientType>,
        route: Route,
    ) -> Option<Route> {
        match client_type {
            Some(t) => self.by_type.insert((from, kind.with_type(t)), route),
            None => self.any_type.insert((from, kind), route),
        }
    }

    pub fn len(&self) -> usize {
        self.by_type.len() + self.any_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RoutingPolicy for RoutingTable {
    fn route(&self, from: StationId, outcome: Outcome) -> Option<Route> {
        // 类型精确匹配优先
        self.by_type
            .get(&(from, outcome))
            .or_else(|| self.any_type.get(&(from, outcome.kind())))
            .copied()
    }
}
