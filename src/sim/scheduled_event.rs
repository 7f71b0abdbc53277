//! 调度事件
//!
//! 定义调度事件结构及其优先级比较。

use super::time::SimTime;
use std::cmp::Ordering;

/// 调度事件，包含执行时间、序列号和事件负载。
#[derive(Debug)]
pub struct ScheduledEvent<E> {
    pub(crate) at: SimTime,
    pub(crate) seq: u64,
    pub(crate) ev: E,
}

impl<E> ScheduledEvent<E> {
    pub fn at(&self) -> SimTime {
        self.at
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn event(&self) -> &E {
        &self.ev
    }

    pub fn into_event(self) -> E {
        self.ev
    }
}

// BinaryHeap 是 max-heap；我们需要最小 (时间, 序列号) 优先，因此反向比较。
impl<E> Ord for ScheduledEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at.cmp(&other.at) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ord => ord,
        }
        .reverse()
    }
}

impl<E> PartialOrd for ScheduledEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> PartialEq for ScheduledEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<E> Eq for ScheduledEvent<E> {}
