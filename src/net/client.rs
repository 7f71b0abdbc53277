//! 客户（数据包）类型
//!
//! 一个逻辑客户可能先后进入多个站点（溢出或继续处理），`arrival_history`
//! 按顺序记录它每次进入/被转交的时间。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::ClientId;
use crate::error::ConfigError;
use crate::sim::SimTime;

/// 客户类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClientType {
    A,
    B,
}

impl ClientType {
    pub const ALL: [ClientType; 2] = [ClientType::A, ClientType::B];
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientType::A => f.write_str("A"),
            ClientType::B => f.write_str("B"),
        }
    }
}

impl FromStr for ClientType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(ClientType::A),
            "B" | "b" => Ok(ClientType::B),
            other => Err(ConfigError::UnknownClientType(other.to_string())),
        }
    }
}

/// 客户记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub client_type: ClientType,
    /// 首次进入网络的时间
    pub arrival_time: SimTime,
    pub arrival_history: Vec<SimTime>,
}

impl Client {
    pub fn new(id: ClientId, client_type: ClientType, now: SimTime) -> Self {
        Self {
            id,
            client_type,
            arrival_time: now,
            arrival_history: vec![now],
        }
    }

    /// 转交给下一个站点：保留 id/类型，追加一条历史记录
    pub fn handed_off(mut self, at: SimTime) -> Self {
        self.arrival_history.push(at);
        self
    }

    /// 从首次到达到 `now` 的累计时长
    pub fn total_delay(&self, now: SimTime) -> f64 {
        now.since(self.arrival_time)
    }
}
