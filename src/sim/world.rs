//! 世界 trait
//!
//! 定义仿真世界接口。

use super::simulator::Simulator;
use crate::error::InvariantViolation;

/// 仿真世界：由业务层实现（例如排队网络/统计等），负责把事件分发给具体对象。
pub trait World<E> {
    /// 处理一个已出队的事件。处理过程中可以向 `sim` 调度新的事件。
    fn dispatch(&mut self, ev: E, sim: &mut Simulator<E>) -> Result<(), InvariantViolation>;

    /// 每个事件处理完之后调用，用于检查事件之间必须成立的不变量。
    fn on_tick(&mut self, _sim: &mut Simulator<E>) -> Result<(), InvariantViolation> {
        Ok(())
    }
}
