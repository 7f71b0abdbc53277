//! 统计观察者
//!
//! 站点在每次到达、离开、溢出/丢失时通知观察者。观察者只拿到记录的只读引用，
//! 无法影响调度结果。`EventLog` 是内置的记录器（存内存，便于测试与导出 JSON）。

use serde::Serialize;

use super::client::ClientType;
use super::event::EventTag;
use super::id::{ClientId, ServerId, StationId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrivalRecord {
    pub time: f64,
    pub station: StationId,
    pub client_id: ClientId,
    pub client_type: ClientType,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureRecord {
    pub time: f64,
    pub station: StationId,
    pub client_id: ClientId,
    pub client_type: ClientType,
    /// 在本站点停留的时间（从进入本站点算起）
    pub queue_delay: f64,
    pub service_time: f64,
    pub server_id: ServerId,
}

/// 被拒绝客户的去向
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    /// 转发到溢出站点
    Overflow { target: StationId, delay: f64 },
    /// 没有溢出路由，永久丢失
    Lost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropRecord {
    pub time: f64,
    pub station: StationId,
    pub client_id: ClientId,
    pub client_type: ClientType,
    #[serde(flatten)]
    pub reason: DropReason,
}

/// 观察者接口（默认全部忽略）
pub trait StatisticsSink {
    fn on_arrival(&mut self, _rec: &ArrivalRecord) {}
    fn on_departure(&mut self, _rec: &DepartureRecord) {}
    fn on_drop(&mut self, _rec: &DropRecord) {}
}

/// 一条记录（JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkRecord {
    Arrival(ArrivalRecord),
    Departure(DepartureRecord),
    Drop(DropRecord),
}

impl SinkRecord {
    pub fn time(&self) -> f64 {
        match self {
            SinkRecord::Arrival(r) => r.time,
            SinkRecord::Departure(r) => r.time,
            SinkRecord::Drop(r) => r.time,
        }
    }

    pub fn station(&self) -> StationId {
        match self {
            SinkRecord::Arrival(r) => r.station,
            SinkRecord::Departure(r) => r.station,
            SinkRecord::Drop(r) => r.station,
        }
    }

    /// 对应的事件种类（溢出/丢失发生在到达事件中）
    pub fn tag(&self) -> EventTag {
        match self {
            SinkRecord::Arrival(_) | SinkRecord::Drop(_) => EventTag::Arrival,
            SinkRecord::Departure(_) => EventTag::Departure,
        }
    }
}

/// 一个简单的事件收集器
#[derive(Debug, Default, Serialize)]
pub struct EventLog {
    pub records: Vec<SinkRecord>,
}

impl EventLog {
    /// (时间, 站点, 事件种类) 轨迹
    pub fn trace(&self) -> Vec<(f64, StationId, EventTag)> {
        self.records
            .iter()
            .map(|r| (r.time(), r.station(), r.tag()))
            .collect()
    }

    pub fn departures(&self) -> impl Iterator<Item = &DepartureRecord> {
        self.records.iter().filter_map(|r| match r {
            SinkRecord::Departure(d) => Some(d),
            _ => None,
        })
    }

    pub fn drops(&self) -> impl Iterator<Item = &DropRecord> {
        self.records.iter().filter_map(|r| match r {
            SinkRecord::Drop(d) => Some(d),
            _ => None,
        })
    }

    pub fn arrivals(&self) -> impl Iterator<Item = &ArrivalRecord> {
        self.records.iter().filter_map(|r| match r {
            SinkRecord::Arrival(a) => Some(a),
            _ => None,
        })
    }
}

impl StatisticsSink for EventLog {
    fn on_arrival(&mut self, rec: &ArrivalRecord) {
        self.records.push(SinkRecord::Arrival(rec.clone()));
    }

    fn on_departure(&mut self, rec: &DepartureRecord) {
        self.records.push(SinkRecord::Departure(rec.clone()));
    }

    fn on_drop(&mut self, rec: &DropRecord) {
        self.records.push(SinkRecord::Drop(rec.clone()));
    }
}
