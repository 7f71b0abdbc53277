//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与未来事件集合（FES）。

use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use crate::error::InvariantViolation;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
///
/// 同一时刻的事件按调度顺序（插入序列号）执行。事件一旦调度就不会被取消，
/// 超过仿真时间上限的事件留在队列中，不视为错误。
pub struct Simulator<E> {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent<E>>,
}

impl<E> Default for Simulator<E> {
    fn default() -> Self {
        Self {
            now: SimTime::ZERO,
            next_seq: 0,
            q: BinaryHeap::new(),
        }
    }
}

impl<E> Simulator<E> {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// 下一个事件的时间（不出队）
    pub fn peek_time(&self) -> Option<SimTime> {
        self.q.peek().map(|item| item.at)
    }

    /// 调度事件在指定时间执行
    pub fn schedule(&mut self, at: SimTime, ev: E) {
        let seq = self.next_seq;
        trace!(now = %self.now, at = %at, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent { at, seq, ev });
    }

    /// 取出 (时间, 序列号) 最小的事件并推进当前时间。
    ///
    /// 如果取出的事件早于当前时间，说明上游调度有 bug，返回 `OutOfOrderEvent`。
    pub fn pop_next(&mut self) -> Result<Option<ScheduledEvent<E>>, InvariantViolation> {
        let Some(item) = self.q.pop() else {
            return Ok(None);
        };
        if item.at < self.now || item.at.0.is_nan() {
            return Err(InvariantViolation::OutOfOrderEvent {
                at: item.at.0,
                now: self.now.0,
            });
        }
        self.now = item.at;
        Ok(Some(item))
    }

    /// 运行直到事件队列为空或下一个事件晚于 `until`，返回执行的事件数。
    pub fn run_until(
        &mut self,
        until: SimTime,
        world: &mut dyn World<E>,
    ) -> Result<u64, InvariantViolation> {
        info!(until = %until, queue_size = self.q.len(), "▶️  开始运行仿真");

        let mut event_count = 0u64;
        while let Some(at) = self.peek_time() {
            if at > until {
                break;
            }
            let Some(item) = self.pop_next()? else {
                break;
            };
            event_count += 1;
            world.dispatch(item.ev, self)?;
            world.on_tick(self)?;
        }
        self.now = self.now.max(until);

        info!(
            total_events = event_count,
            final_time = %self.now,
            orphaned = self.q.len(),
            "✅ 仿真完成"
        );
        Ok(event_count)
    }

    /// 运行所有事件直到队列为空。带外部到达过程的网络永远不会清空，应使用 `run_until`。
    pub fn run(&mut self, world: &mut dyn World<E>) -> Result<u64, InvariantViolation> {
        debug!(now = %self.now, queue_size = self.q.len(), "初始状态");

        let mut event_count = 0u64;
        while let Some(item) = self.pop_next()? {
            event_count += 1;
            trace!(
                event_num = event_count,
                now = %self.now,
                seq = item.seq(),
                remaining_queue = self.q.len(),
                "执行事件"
            );
            world.dispatch(item.ev, self)?;
            world.on_tick(self)?;
        }

        info!(total_events = event_count, final_time = %self.now, "✅ 仿真完成");
        Ok(event_count)
    }
}
