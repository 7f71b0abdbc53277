//! 排队网络
//!
//! 网络独占所有站点、路由策略、随机数源和观察者。事件由仿真器出队后交给网络，
//! 网络再分发给目标站点；站点交还的客户（被拒绝或服务完成）由网络按路由转发、
//! 计为丢失，或离开网络。

use std::collections::HashMap;

use super::client::{Client, ClientType};
use super::event::{Event, EventKind};
use super::id::{ClientId, ServerId, StationId};
use super::routing::{Outcome, OutcomeKind, Route, RoutingPolicy, RoutingTable};
use super::sink::{ArrivalRecord, DepartureRecord, DropReason, DropRecord, EventLog, StatisticsSink};
use crate::error::{ConfigError, InvariantViolation};
use crate::queue::{Admission, Station, StationConfig, StationReport};
use crate::sim::{SimRng, SimTime, Simulator, World};
use serde::Serialize;
use tracing::{debug, info, trace};

/// 整个网络的统计信息
#[derive(Debug, Default, Clone, Serialize)]
pub struct NetStats {
    /// 进入网络的客户数
    pub created: u64,
    /// 离开最后一个站点的客户数
    pub completed: u64,
    /// 永久丢失的客户数
    pub lost: u64,
    /// 站点之间的转交次数（溢出 + 继续处理）
    pub transfers: u64,
    /// 离开网络的客户从首次到达起的累计时延之和
    pub end_to_end_delay_sum: f64,
}

/// 网络汇总
#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub time: f64,
    pub stats: NetStats,
    pub avg_end_to_end_delay: f64,
    pub stations: Vec<StationReport>,
}

pub struct Network {
    stations: Vec<Station>,
    names: HashMap<String, StationId>,
    routes: RoutingTable,
    policy: Option<Box<dyn RoutingPolicy>>,
    rng: SimRng,
    next_client_id: u64,
    /// 内置事件记录器（None 表示不记录）
    pub log: Option<EventLog>,
    pub(super) sinks: Vec<Box<dyn StatisticsSink>>,
    /// 每个事件之后检查所有站点的不变量
    pub check_invariants: bool,
    pub stats: NetStats,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Network {
    pub fn new(seed: u64) -> Self {
        Self {
            stations: Vec::new(),
            names: HashMap::new(),
            routes: RoutingTable::new(),
            policy: None,
            rng: SimRng::seed_from_u64(seed),
            next_client_id: 0,
            log: None,
            sinks: Vec::new(),
            check_invariants: true,
            stats: NetStats::default(),
        }
    }

    /// 添加站点（构造时校验配置）
    pub fn add_station(&mut self, cfg: StationConfig) -> Result<StationId, ConfigError> {
        if self.names.contains_key(&cfg.name) {
            return Err(ConfigError::DuplicateStation(cfg.name));
        }
        let id = StationId(self.stations.len());
        let station = Station::new(id, cfg)?;
        self.names.insert(station.name().to_string(), id);
        self.stations.push(station);
        Ok(id)
    }

    /// 按名字查找站点
    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.names.get(name).copied()
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.0)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// 添加一条路由：`client_type` 为 None 时对所有类型生效
    pub fn add_route(
        &mut self,
        from: StationId,
        kind: OutcomeKind,
        client_type: Option<ClientType>,
        to: StationId,
        delay: f64,
    ) -> Result<(), ConfigError> {
        for id in [from, to] {
            if id.0 >= self.stations.len() {
                return Err(ConfigError::UnknownStation(id.to_string()));
            }
        }
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(ConfigError::InvalidDelay(delay));
        }
        debug!(from = %from, to = %to, %kind, ?client_type, delay, "添加路由");
        self.routes.insert(from, kind, client_type, Route { target: to, delay });
        Ok(())
    }

    /// 用自定义路由策略替换默认路由表
    pub fn set_routing_policy(&mut self, policy: Box<dyn RoutingPolicy>) {
        self.policy = Some(policy);
    }

    pub fn add_sink(&mut self, sink: Box<dyn StatisticsSink>) {
        self.sinks.push(sink);
    }

    /// 修改外部到达率。站点原本没有到达过程时，立即在当前时刻开始产生到达。
    pub fn set_arrival_rate(
        &mut self,
        id: StationId,
        rate: f64,
        sim: &mut Simulator<Event>,
    ) -> Result<(), ConfigError> {
        let station = self
            .stations
            .get_mut(id.0)
            .ok_or_else(|| ConfigError::UnknownStation(id.to_string()))?;
        let had_process = station.arrival_process().is_some();
        station.set_arrival_rate(rate)?;
        info!(station = %station.name(), rate, "修改到达率");
        if !had_process {
            self.schedule_external_arrival(id, sim.now(), sim);
        }
        Ok(())
    }

    /// 为每个带外部到达过程的站点在当前时刻调度第一次到达
    pub fn prime(&mut self, sim: &mut Simulator<Event>) {
        let now = sim.now();
        for i in 0..self.stations.len() {
            if self.stations[i].arrival_process().is_some() {
                self.schedule_external_arrival(StationId(i), now, sim);
            }
        }
    }

    fn route(&self, from: StationId, outcome: Outcome) -> Option<Route> {
        match &self.policy {
            Some(p) => p.route(from, outcome),
            None => self.routes.route(from, outcome),
        }
    }

    fn alloc_client_id(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id = self.next_client_id.wrapping_add(1);
        id
    }

    /// 按到达过程取样客户类型，在 `at` 调度一次外部到达
    fn schedule_external_arrival(&mut self, id: StationId, at: SimTime, sim: &mut Simulator<Event>) {
        let Some(process) = self.stations[id.0].arrival_process() else {
            return;
        };
        let client_type = process.sample_type(&mut self.rng);
        sim.schedule(at, Event::arrival(id, client_type));
    }

    /// 转交给另一站点：追加历史记录并在时延后调度到达
    fn forward(&mut self, client: Client, route: Route, now: SimTime, sim: &mut Simulator<Event>) {
        let client = client.handed_off(now);
        trace!(client = client.id.0, target = %route.target, delay = route.delay, "转发客户");
        self.stats.transfers += 1;
        sim.schedule(now.after(route.delay), Event::transfer(route.target, client));
    }

    #[tracing::instrument(skip(self, carried, sim), fields(now = %sim.now()))]
    fn handle_arrival(
        &mut self,
        station: StationId,
        client_type: ClientType,
        carried: Option<Client>,
        sim: &mut Simulator<Event>,
    ) -> Result<(), InvariantViolation> {
        let now = sim.now();
        let client = match carried {
            Some(c) => c,
            None => {
                // 先调度下一次外部到达，再处理本次到达
                if let Some(process) = self.stations[station.0].arrival_process() {
                    let gap = self.rng.exp(process.rate)?;
                    self.schedule_external_arrival(station, now.after(gap), sim);
                }
                self.stats.created += 1;
                let id = self.alloc_client_id();
                Client::new(id, client_type, now)
            }
        };
        let client_id = client.id;

        let admission = self.stations[station.0].on_arrival(now, client, sim, &mut self.rng)?;
        let accepted = matches!(admission, Admission::Admitted);
        self.emit_arrival(ArrivalRecord {
            time: now.as_f64(),
            station,
            client_id,
            client_type,
            accepted,
        });

        if let Admission::Rejected(client) = admission {
            let reason = match self.route(station, Outcome::Overflow(client_type)) {
                Some(route) => {
                    self.stations[station.0].note_rejection(client_type, true);
                    self.forward(client, route, now, sim);
                    DropReason::Overflow {
                        target: route.target,
                        delay: route.delay,
                    }
                }
                None => {
                    self.stations[station.0].note_rejection(client_type, false);
                    self.stats.lost += 1;
                    debug!(client = client_id.0, "客户永久丢失");
                    DropReason::Lost
                }
            };
            self.emit_drop(DropRecord {
                time: now.as_f64(),
                station,
                client_id,
                client_type,
                reason,
            });
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, sim), fields(now = %sim.now()))]
    fn handle_departure(
        &mut self,
        station: StationId,
        client_id: ClientId,
        server_id: ServerId,
        sim: &mut Simulator<Event>,
    ) -> Result<(), InvariantViolation> {
        let now = sim.now();
        let departed =
            self.stations[station.0].on_departure(now, client_id, server_id, sim, &mut self.rng)?;
        let client_type = departed.client.client_type;

        self.emit_departure(DepartureRecord {
            time: now.as_f64(),
            station,
            client_id,
            client_type,
            queue_delay: departed.delay,
            service_time: departed.service_time,
            server_id: departed.server,
        });

        match self.route(station, Outcome::Departure(client_type)) {
            Some(route) => self.forward(departed.client, route, now, sim),
            None => {
                self.stats.completed += 1;
                self.stats.end_to_end_delay_sum += departed.client.total_delay(now);
            }
        }
        Ok(())
    }

    /// 生成到 `now` 为止的汇总
    pub fn report(&self, now: SimTime) -> NetworkReport {
        NetworkReport {
            time: now.as_f64(),
            stats: self.stats.clone(),
            avg_end_to_end_delay: if self.stats.completed > 0 {
                self.stats.end_to_end_delay_sum / self.stats.completed as f64
            } else {
                0.0
            },
            stations: self.stations.iter().map(|s| s.report(now)).collect(),
        }
    }
}

impl World<Event> for Network {
    fn dispatch(&mut self, ev: Event, sim: &mut Simulator<Event>) -> Result<(), InvariantViolation> {
        let Event { station, kind } = ev;
        if station.0 >= self.stations.len() {
            return Err(InvariantViolation::UnknownStation(station.0));
        }
        match kind {
            EventKind::Arrival {
                client_type,
                client,
            } => self.handle_arrival(station, client_type, client, sim),
            EventKind::Departure {
                client_id,
                server_id,
                ..
            } => self.handle_departure(station, client_id, server_id, sim),
        }
    }

    fn on_tick(&mut self, _sim: &mut Simulator<Event>) -> Result<(), InvariantViolation> {
        if self.check_invariants {
            for s in &self.stations {
                s.check_invariants()?;
            }
        }
        Ok(())
    }
}
