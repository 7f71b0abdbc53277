//! 排队网络模块
//!
//! 此模块包含排队网络的核心组件，如客户、事件、路由、观察者和网络本身。

// 子模块声明
mod client;
mod event;
mod id;
mod network;
mod network_sink;
mod routing;
mod sink;

// 重新导出公共接口
pub use client::{Client, ClientType};
pub use event::{Event, EventKind, EventTag};
pub use id::{ClientId, ServerId, StationId};
pub use network::{NetStats, Network, NetworkReport};
pub use routing::{Outcome, OutcomeKind, Route, RoutingPolicy, RoutingTable};
pub use sink::{
    ArrivalRecord, DepartureRecord, DropReason, DropRecord, EventLog, SinkRecord,
    StatisticsSink,
};
