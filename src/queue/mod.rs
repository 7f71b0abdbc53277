//! 站点与服务器池
//!
//! 站点是一条 FIFO 队列加一个服务器池；服务器池负责按分配策略挑选服务器、
//! 记录忙闲状态与成本；服务时间按站点配置的分布取样。

mod server_pool;
mod service;
mod station;
mod stats;

pub use server_pool::{AllocationPolicy, DoubleBooking, Server, ServerPool};
pub use service::ServiceDistribution;
pub use station::{
    Admission, ArrivalProcess, Capacity, Departed, ServerCount, Station, StationConfig,
};
pub use stats::{PerType, StationReport, StationStats};
