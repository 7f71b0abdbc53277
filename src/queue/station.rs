//! 站点（单队列状态机）
//!
//! 一个站点 = 一条 FIFO 队列 + 服务器池，对应一个 M/G/s/n 排队系统。
//! 队列中按到达顺序保存站内所有客户（正在服务的 + 等待中的）；正在服务的
//! 客户总是队列的前缀，因为服务总是按队列顺序开始。
//!
//! 站点不认识其他站点：被拒绝或服务完成的客户交还给网络，由网络决定去向。

use std::collections::VecDeque;

use super::server_pool::{AllocationPolicy, ServerPool};
use super::service::ServiceDistribution;
use super::stats::{PerType, StationReport, StationStats, ratio};
use crate::error::{ConfigError, InvariantViolation};
use crate::net::{Client, ClientId, ClientType, Event, ServerId, StationId};
use crate::sim::{SimRng, SimTime, Simulator};
use tracing::{debug, trace, warn};

/// 站点容量（排队 + 服务中的客户总数上限）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Finite(usize),
    Unbounded,
}

impl From<Option<usize>> for Capacity {
    fn from(v: Option<usize>) -> Self {
        v.map_or(Capacity::Unbounded, Capacity::Finite)
    }
}

/// 服务器数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCount {
    Finite(usize),
    Unbounded,
}

impl From<Option<usize>> for ServerCount {
    fn from(v: Option<usize>) -> Self {
        v.map_or(ServerCount::Unbounded, ServerCount::Finite)
    }
}

/// 外部泊松到达过程
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalProcess {
    pub rate: f64,
    /// B 类客户所占比例
    pub fraction_b: f64,
}

impl ArrivalProcess {
    pub fn sample_type(&self, rng: &mut SimRng) -> ClientType {
        if rng.bernoulli(self.fraction_b) {
            ClientType::B
        } else {
            ClientType::A
        }
    }
}

/// 站点配置
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub name: String,
    pub capacity: Capacity,
    pub servers: ServerCount,
    /// 一个值表示所有服务器相同，否则每台服务器一个值
    pub service_rates: Vec<f64>,
    /// 缺省时每台服务器的成本等于其服务率
    pub service_costs: Option<Vec<f64>>,
    pub policy: AllocationPolicy,
    pub distribution: ServiceDistribution,
    pub arrival: Option<ArrivalProcess>,
}

impl StationConfig {
    /// 单服务器、无限容量、服务率 1、指数服务、无外部到达
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: Capacity::Unbounded,
            servers: ServerCount::Finite(1),
            service_rates: vec![1.0],
            service_costs: None,
            policy: AllocationPolicy::FirstIdle,
            distribution: ServiceDistribution::Exponential,
            arrival: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InService {
    server: ServerId,
    duration: f64,
}

#[derive(Debug, Clone)]
struct Resident {
    client: Client,
    /// 进入本站点的时间
    entered_at: SimTime,
    service: Option<InService>,
}

/// 到达的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Admitted,
    /// 容量已满，客户交还给调用方
    Rejected(Client),
}

/// 一次服务完成
#[derive(Debug, Clone, PartialEq)]
pub struct Departed {
    pub client: Client,
    pub server: ServerId,
    /// 在本站点的停留时间
    pub delay: f64,
    pub service_time: f64,
}

#[derive(Debug, Clone)]
pub struct Station {
    id: StationId,
    name: String,
    capacity: Capacity,
    queue: VecDeque<Resident>,
    pending: usize,
    in_service: usize,
    pool: ServerPool,
    distribution: ServiceDistribution,
    arrival: Option<ArrivalProcess>,
    stats: StationStats,
}

impl Station {
    /// 校验配置并创建站点
    pub fn new(id: StationId, cfg: StationConfig) -> Result<Self, ConfigError> {
        let StationConfig {
            name,
            mut capacity,
            servers,
            service_rates,
            service_costs,
            policy,
            distribution,
            arrival,
        } = cfg;

        if capacity == Capacity::Finite(0) {
            return Err(ConfigError::ZeroCapacity { station: name });
        }

        let pool = match servers {
            ServerCount::Finite(0) => return Err(ConfigError::ZeroServers { station: name }),
            ServerCount::Finite(n) => {
                if let Capacity::Finite(c) = capacity {
                    if c < n {
                        return Err(ConfigError::CapacityBelowServers {
                            station: name,
                            capacity: c,
                            servers: n,
                        });
                    }
                }
                let rates = broadcast(&name, "service rates", service_rates, n)?;
                let costs = match service_costs {
                    Some(c) => broadcast(&name, "service costs", c, n)?,
                    None => rates.clone(),
                };
                ServerPool::finite(name.clone(), rates, costs, policy)?
            }
            ServerCount::Unbounded => {
                if let Capacity::Finite(c) = capacity {
                    warn!(station = %name, capacity = c, "无限服务器前不能有有限缓冲区，容量改为无限");
                    capacity = Capacity::Unbounded;
                }
                if service_costs.is_some() {
                    return Err(ConfigError::CostsNeedFiniteServers { station: name });
                }
                let rates = broadcast(&name, "service rates", service_rates, 1)?;
                ServerPool::unbounded(name.clone(), rates[0], policy)?
            }
        };

        if let Some(a) = arrival {
            check_arrival(&name, a)?;
        }

        debug!(
            station = %name,
            id = id.0,
            ?capacity,
            servers = ?pool.capacity(),
            policy = %policy,
            distribution = %distribution,
            "创建站点"
        );

        Ok(Self {
            id,
            name,
            capacity,
            queue: VecDeque::new(),
            pending: 0,
            in_service: 0,
            pool,
            distribution,
            arrival,
            stats: StationStats::default(),
        })
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// 站内客户数（排队 + 服务中）
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_service(&self) -> usize {
        self.in_service
    }

    /// 站内客户，按到达顺序
    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.queue.iter().map(|r| &r.client)
    }

    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    pub fn stats(&self) -> &StationStats {
        &self.stats
    }

    pub fn arrival_process(&self) -> Option<ArrivalProcess> {
        self.arrival
    }

    pub fn distribution(&self) -> ServiceDistribution {
        self.distribution
    }

    /// 修改外部到达率（用于分阶段实验）
    pub fn set_arrival_rate(&mut self, rate: f64) -> Result<(), ConfigError> {
        let a = ArrivalProcess {
            rate,
            fraction_b: self.arrival.map_or(0.0, |a| a.fraction_b),
        };
        check_arrival(&self.name, a)?;
        self.arrival = Some(a);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        match self.capacity {
            Capacity::Finite(c) => self.pending >= c,
            Capacity::Unbounded => false,
        }
    }

    /// 处理一次到达。
    ///
    /// 容量已满时拒绝并把客户交还给调用方；否则入队，若有空闲服务器则立即开始服务。
    #[tracing::instrument(skip(self, client, sim, rng), fields(station = %self.name, client = client.id.0, client_type = %client.client_type))]
    pub fn on_arrival(
        &mut self,
        now: SimTime,
        client: Client,
        sim: &mut Simulator<Event>,
        rng: &mut SimRng,
    ) -> Result<Admission, InvariantViolation> {
        self.stats.advance(now, self.pending, self.pool.capacity());
        *self.stats.arrivals.get_mut(client.client_type) += 1;

        if self.is_full() {
            debug!(pending = self.pending, "容量已满，拒绝客户");
            return Ok(Admission::Rejected(client));
        }

        *self.stats.admitted.get_mut(client.client_type) += 1;
        self.queue.push_back(Resident {
            client,
            entered_at: now,
            service: None,
        });
        self.pending += 1;
        self.stats.max_users = self.stats.max_users.max(self.pending);
        trace!(pending = self.pending, in_service = self.in_service, "客户入队");

        if self.in_service < self.pending && self.pool.has_idle() {
            self.start_next_service(now, sim, rng)?;
        }
        Ok(Admission::Admitted)
    }

    /// 处理一次服务完成：移除该客户、释放服务器，若还有等待的客户则开始下一次服务。
    #[tracing::instrument(skip(self, sim, rng), fields(station = %self.name))]
    pub fn on_departure(
        &mut self,
        now: SimTime,
        client_id: ClientId,
        server_id: ServerId,
        sim: &mut Simulator<Event>,
        rng: &mut SimRng,
    ) -> Result<Departed, InvariantViolation> {
        self.stats.advance(now, self.pending, self.pool.capacity());

        let pos = self
            .queue
            .iter()
            .take(self.in_service)
            .position(|r| {
                r.client.id == client_id && r.service.is_some_and(|s| s.server == server_id)
            })
            .ok_or_else(|| InvariantViolation::ClientNotInService {
                station: self.name.clone(),
                client: client_id.0,
                server: server_id.0,
            })?;

        let Some(resident) = self.queue.remove(pos) else {
            return Err(InvariantViolation::ClientNotInService {
                station: self.name.clone(),
                client: client_id.0,
                server: server_id.0,
            });
        };
        self.pending -= 1;
        self.in_service -= 1;
        self.pool.make_idle(server_id, now)?;

        let delay = now.since(resident.entered_at);
        let service_time = resident.service.map_or(0.0, |s| s.duration);
        self.stats.record_departure(resident.client.client_type, delay);
        debug!(
            client = client_id.0,
            server = server_id.0,
            delay,
            pending = self.pending,
            "客户离开"
        );

        if self.in_service < self.pending && self.pool.has_idle() {
            self.start_next_service(now, sim, rng)?;
        }

        Ok(Departed {
            client: resident.client,
            server: server_id,
            delay,
            service_time,
        })
    }

    /// 记录一次拒绝的去向（转发或永久丢失）
    pub(crate) fn note_rejection(&mut self, t: ClientType, forwarded: bool) {
        if forwarded {
            *self.stats.forwarded.get_mut(t) += 1;
        } else {
            *self.stats.lost.get_mut(t) += 1;
        }
    }

    /// 为队列中第一个等待的客户分配服务器并调度其离开事件
    fn start_next_service(
        &mut self,
        now: SimTime,
        sim: &mut Simulator<Event>,
        rng: &mut SimRng,
    ) -> Result<(), InvariantViolation> {
        let server = self.pool.select_server()?;
        let duration = self
            .pool
            .sample_service_time(server, self.distribution, rng)?;
        self.pool.make_busy(server, now)?;

        let idx = self.in_service;
        if idx >= self.queue.len() {
            return Err(InvariantViolation::QueueLengthMismatch {
                station: self.name.clone(),
                queue_len: self.queue.len(),
                pending: self.pending,
            });
        }
        let resident = &mut self.queue[idx];
        resident.service = Some(InService { server, duration });
        let waiting = now.since(resident.entered_at);
        let ev = Event::departure(self.id, resident.client.id, resident.client.client_type, server);
        self.in_service += 1;
        self.stats.record_service_start(waiting, duration);

        trace!(server = server.0, duration, waiting, "开始服务");
        sim.schedule(now.after(duration), ev);
        Ok(())
    }

    /// 检查事件之间必须成立的不变量
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.queue.len() != self.pending {
            return Err(InvariantViolation::QueueLengthMismatch {
                station: self.name.clone(),
                queue_len: self.queue.len(),
                pending: self.pending,
            });
        }
        if let Capacity::Finite(c) = self.capacity {
            if self.pending > c {
                return Err(InvariantViolation::CapacityExceeded {
                    station: self.name.clone(),
                    pending: self.pending,
                    capacity: c,
                });
            }
        }
        let expected = match self.pool.capacity() {
            Some(n) => self.pending.min(n),
            None => self.pending,
        };
        let busy = self.pool.busy_count();
        if busy != expected || busy != self.in_service {
            return Err(InvariantViolation::BusyServerMismatch {
                station: self.name.clone(),
                busy,
                expected,
            });
        }
        Ok(())
    }

    /// 生成到 `now` 为止的汇总
    pub fn report(&self, now: SimTime) -> StationReport {
        let mut s = self.stats.clone();
        s.advance(now, self.pending, self.pool.capacity());
        let t = now.as_f64();
        let arrivals = s.arrivals.total() as f64;
        let departures = s.departures.total();
        let delay_total = s.delay_sum.a + s.delay_sum.b;

        StationReport {
            name: self.name.clone(),
            time: t,
            arrivals: s.arrivals,
            admitted: s.admitted,
            departures: s.departures,
            forwarded: s.forwarded,
            lost: s.lost,
            users_now: self.pending,
            max_users: s.max_users,
            avg_users: ratio(s.users_time, t),
            avg_buffer: ratio(s.buffer_time, t),
            avg_delay: ratio(delay_total, departures as f64),
            avg_delay_by_type: PerType {
                a: ratio(s.delay_sum.a, s.departures.a as f64),
                b: ratio(s.delay_sum.b, s.departures.b as f64),
            },
            avg_waiting: ratio(s.waiting_sum, s.services_started as f64),
            avg_waiting_nonzero: ratio(s.waiting_sum, s.waited as f64),
            avg_service_time: ratio(s.service_time_sum, s.services_started as f64),
            rejection_probability: ratio(
                (s.forwarded.total() + s.lost.total()) as f64,
                arrivals,
            ),
            loss_probability: ratio(s.lost.total() as f64, arrivals),
            arrival_rate: ratio(arrivals, t),
            departure_rate: ratio(departures as f64, t),
            utilization: self
                .pool
                .busy_time_until(now)
                .into_iter()
                .map(|b| ratio(b, t))
                .collect(),
            total_cost: self.pool.total_cost(),
            double_bookings: self.pool.double_bookings().len(),
        }
    }
}

/// 一个值扩展到每台服务器，或者要求恰好 n 个值
fn broadcast(
    station: &str,
    what: &'static str,
    values: Vec<f64>,
    n: usize,
) -> Result<Vec<f64>, ConfigError> {
    match values.len() {
        1 => Ok(vec![values[0]; n]),
        len if len == n => Ok(values),
        got => Err(ConfigError::LengthMismatch {
            station: station.to_string(),
            what,
            expected: n,
            got,
        }),
    }
}

fn check_arrival(station: &str, a: ArrivalProcess) -> Result<(), ConfigError> {
    if !(a.rate.is_finite() && a.rate > 0.0) {
        return Err(ConfigError::NonPositiveRate {
            station: station.to_string(),
            what: "arrival rate",
            value: a.rate,
        });
    }
    if !(0.0..=1.0).contains(&a.fraction_b) {
        return Err(ConfigError::InvalidFraction {
            station: station.to_string(),
            value: a.fraction_b,
        });
    }
    Ok(())
}
