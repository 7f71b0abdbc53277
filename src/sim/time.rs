//! 仿真时间类型
//!
//! 排队模型使用连续时间，因此这里用 `f64` 表示，并借助 `total_cmp` 提供全序。

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 仿真时间（任意时间单位，与到达率/服务率同口径）。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// 从当前时刻起经过 `dt` 之后的时间点
    pub fn after(self, dt: f64) -> SimTime {
        SimTime(self.0 + dt)
    }

    /// 距离更早时刻 `earlier` 的时长
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
