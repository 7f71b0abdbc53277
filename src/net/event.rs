//! 排队网络事件
//!
//! 事件负载按种类静态确定：到达携带客户类型（以及转发时的客户记录），
//! 离开携带客户 id/类型和服务它的服务器。

use super::client::{Client, ClientType};
use super::id::{ClientId, ServerId, StationId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub station: StationId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `client` 为 None 表示外部到达过程产生的新客户；否则为从其他站点转来的客户
    Arrival {
        client_type: ClientType,
        client: Option<Client>,
    },
    Departure {
        client_id: ClientId,
        client_type: ClientType,
        server_id: ServerId,
    },
}

/// 只包含种类的标签，用于轨迹比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    Arrival,
    Departure,
}

impl Event {
    /// 外部到达
    pub fn arrival(station: StationId, client_type: ClientType) -> Self {
        Self {
            station,
            kind: EventKind::Arrival {
                client_type,
                client: None,
            },
        }
    }

    /// 从其他站点转入的到达
    pub fn transfer(station: StationId, client: Client) -> Self {
        Self {
            station,
            kind: EventKind::Arrival {
                client_type: client.client_type,
                client: Some(client),
            },
        }
    }

    pub fn departure(
        station: StationId,
        client_id: ClientId,
        client_type: ClientType,
        server_id: ServerId,
    ) -> Self {
        Self {
            station,
            kind: EventKind::Departure {
                client_id,
                client_type,
                server_id,
            },
        }
    }

    pub fn tag(&self) -> EventTag {
        match self.kind {
            EventKind::Arrival { .. } => EventTag::Arrival,
            EventKind::Departure { .. } => EventTag::Departure,
        }
    }
}
