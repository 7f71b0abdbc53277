//! 服务器池
//!
//! 决定下一位客户由哪台空闲服务器服务，并跟踪每台服务器的忙/闲状态、
//! 累计忙碌时间与服务成本。

use std::fmt;
use std::str::FromStr;

use super::service::ServiceDistribution;
use crate::error::{ConfigError, InvariantViolation};
use crate::net::ServerId;
use crate::sim::{SimRng, SimTime};
use tracing::{trace, warn};

/// 服务器分配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationPolicy {
    /// 从 0 号开始找第一台空闲服务器
    #[default]
    FirstIdle,
    /// 从上次选中的下一台开始循环查找
    RoundRobin,
    /// 按服务率从高到低（同速按 id 升序）找第一台空闲服务器
    FasterFirst,
}

impl FromStr for AllocationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_idle" => Ok(AllocationPolicy::FirstIdle),
            "round_robin" => Ok(AllocationPolicy::RoundRobin),
            "faster_first" => Ok(AllocationPolicy::FasterFirst),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPolicy::FirstIdle => f.write_str("first_idle"),
            AllocationPolicy::RoundRobin => f.write_str("round_robin"),
            AllocationPolicy::FasterFirst => f.write_str("faster_first"),
        }
    }
}

/// 单台服务器
#[derive(Debug, Clone)]
pub struct Server {
    pub id: ServerId,
    pub rate: f64,
    /// 每开始一次服务累加的成本
    pub cost: f64,
    pub busy: bool,
    /// 已结束的服务区间累计时长
    pub busy_time: f64,
    pub service_started_at: SimTime,
    pub services: u64,
}

impl Server {
    fn new(id: usize, rate: f64, cost: f64) -> Self {
        Self {
            id: ServerId(id),
            rate,
            cost,
            busy: false,
            busy_time: 0.0,
            service_started_at: SimTime::ZERO,
            services: 0,
        }
    }
}

/// 重复置忙/置闲的记录（非致命）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleBooking {
    pub server: ServerId,
    pub at: SimTime,
    /// true: 对忙服务器再次置忙；false: 对闲服务器再次置闲
    pub already_busy: bool,
}

#[derive(Debug, Clone)]
pub struct ServerPool {
    station: String,
    servers: Vec<Server>,
    policy: AllocationPolicy,
    cursor: usize,
    /// 无限服务器池：按需新增服务器时使用的 (rate, cost)
    grow_with: Option<(f64, f64)>,
    /// FasterFirst 的查找顺序
    by_speed: Vec<usize>,
    busy: usize,
    total_cost: f64,
    double_bookings: Vec<DoubleBooking>,
}

impl ServerPool {
    /// 有限服务器池：`rates`/`costs` 每台服务器一个值
    pub fn finite(
        station: impl Into<String>,
        rates: Vec<f64>,
        costs: Vec<f64>,
        policy: AllocationPolicy,
    ) -> Result<Self, ConfigError> {
        let station = station.into();
        if rates.is_empty() {
            return Err(ConfigError::ZeroServers { station });
        }
        if costs.len() != rates.len() {
            return Err(ConfigError::LengthMismatch {
                station,
                what: "service costs",
                expected: rates.len(),
                got: costs.len(),
            });
        }
        for &r in &rates {
            check_rate(&station, r)?;
        }
        for &c in &costs {
            check_cost(&station, c)?;
        }

        let servers: Vec<Server> = rates
            .iter()
            .zip(&costs)
            .enumerate()
            .map(|(i, (&r, &c))| Server::new(i, r, c))
            .collect();

        let mut by_speed: Vec<usize> = (0..servers.len()).collect();
        by_speed.sort_by(|&a, &b| {
            servers[b]
                .rate
                .total_cmp(&servers[a].rate)
                .then(a.cmp(&b))
        });

        let n = servers.len();
        Ok(Self {
            station,
            servers,
            policy,
            // 第一次轮询从 0 号开始
            cursor: n - 1,
            grow_with: None,
            by_speed,
            busy: 0,
            total_cost: 0.0,
            double_bookings: Vec::new(),
        })
    }

    /// 无限服务器池：只支持 FirstIdle，服务器按需创建，全部使用同一服务率
    pub fn unbounded(
        station: impl Into<String>,
        rate: f64,
        policy: AllocationPolicy,
    ) -> Result<Self, ConfigError> {
        let station = station.into();
        check_rate(&station, rate)?;
        if policy != AllocationPolicy::FirstIdle {
            return Err(ConfigError::PolicyNeedsFiniteServers {
                station,
                policy: policy.to_string(),
            });
        }
        Ok(Self {
            station,
            servers: Vec::new(),
            policy,
            cursor: 0,
            grow_with: Some((rate, 0.0)),
            by_speed: Vec::new(),
            busy: 0,
            total_cost: 0.0,
            double_bookings: Vec::new(),
        })
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// 服务器数量上限；None 表示无限
    pub fn capacity(&self) -> Option<usize> {
        match self.grow_with {
            Some(_) => None,
            None => Some(self.servers.len()),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.grow_with.is_some()
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn busy_count(&self) -> usize {
        self.busy
    }

    pub fn has_idle(&self) -> bool {
        match self.capacity() {
            Some(n) => self.busy < n,
            None => true,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn double_bookings(&self) -> &[DoubleBooking] {
        &self.double_bookings
    }

    pub fn rate(&self, id: ServerId) -> Result<f64, InvariantViolation> {
        Ok(self.get(id)?.rate)
    }

    /// 按分配策略选出一台空闲服务器（不改变忙闲状态）。
    ///
    /// 调用方必须保证至少有一台空闲服务器，否则返回 `NoIdleServer`。
    pub fn select_server(&mut self) -> Result<ServerId, InvariantViolation> {
        let n = self.servers.len();
        let picked = match self.policy {
            AllocationPolicy::FirstIdle => self.servers.iter().position(|s| !s.busy),
            AllocationPolicy::RoundRobin => {
                let start = (self.cursor + 1) % n.max(1);
                (0..n)
                    .map(|k| (start + k) % n)
                    .find(|&i| !self.servers[i].busy)
            }
            AllocationPolicy::FasterFirst => {
                self.by_speed.iter().copied().find(|&i| !self.servers[i].busy)
            }
        };

        let idx = match (picked, self.grow_with) {
            (Some(i), _) => i,
            (None, Some((rate, cost))) => {
                self.servers.push(Server::new(n, rate, cost));
                n
            }
            (None, None) => {
                return Err(InvariantViolation::NoIdleServer {
                    station: self.station.clone(),
                });
            }
        };

        if self.policy == AllocationPolicy::RoundRobin {
            self.cursor = idx;
        }
        trace!(station = %self.station, policy = %self.policy, server = idx, "选中服务器");
        Ok(ServerId(idx))
    }

    /// 标记服务器开始服务，并累加该服务器的成本
    pub fn make_busy(&mut self, id: ServerId, now: SimTime) -> Result<(), InvariantViolation> {
        if id.0 >= self.servers.len() {
            return Err(self.unknown_server(id));
        }
        let server = &mut self.servers[id.0];
        if server.busy {
            self.record_double_booking(id, now, true);
            return Ok(());
        }
        server.busy = true;
        server.service_started_at = now;
        server.services += 1;
        self.total_cost += server.cost;
        self.busy += 1;
        Ok(())
    }

    /// 标记服务器空闲，并结算本次服务的忙碌时长
    pub fn make_idle(&mut self, id: ServerId, now: SimTime) -> Result<(), InvariantViolation> {
        if id.0 >= self.servers.len() {
            return Err(self.unknown_server(id));
        }
        let server = &mut self.servers[id.0];
        if !server.busy {
            self.record_double_booking(id, now, false);
            return Ok(());
        }
        server.busy = false;
        server.busy_time += now.since(server.service_started_at);
        self.busy -= 1;
        Ok(())
    }

    fn record_double_booking(&mut self, id: ServerId, now: SimTime, already_busy: bool) {
        warn!(
            station = %self.station,
            server = id.0,
            now = %now,
            already_busy,
            "服务器重复置为相同状态"
        );
        self.double_bookings.push(DoubleBooking {
            server: id,
            at: now,
            already_busy,
        });
    }

    /// 为指定服务器取样一次服务时间
    pub fn sample_service_time(
        &self,
        id: ServerId,
        distribution: ServiceDistribution,
        rng: &mut SimRng,
    ) -> Result<f64, InvariantViolation> {
        let rate = self.rate(id)?;
        distribution.sample(rate, rng)
    }

    /// 每台服务器到 `now` 为止的忙碌时长（含尚未结束的服务）
    pub fn busy_time_until(&self, now: SimTime) -> Vec<f64> {
        self.servers
            .iter()
            .map(|s| {
                if s.busy {
                    s.busy_time + now.since(s.service_started_at)
                } else {
                    s.busy_time
                }
            })
            .collect()
    }

    fn get(&self, id: ServerId) -> Result<&Server, InvariantViolation> {
        self.servers.get(id.0).ok_or_else(|| self.unknown_server(id))
    }

    fn unknown_server(&self, id: ServerId) -> InvariantViolation {
        InvariantViolation::UnknownServer {
            station: self.station.clone(),
            server: id.0,
            servers: self.servers.len(),
        }
    }
}

fn check_rate(station: &str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveRate {
            station: station.to_string(),
            what: "service rate",
            value: rate,
        })
    }
}

fn check_cost(station: &str, cost: f64) -> Result<(), ConfigError> {
    if cost.is_finite() && cost >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCost {
            station: station.to_string(),
            value: cost,
        })
    }
}
