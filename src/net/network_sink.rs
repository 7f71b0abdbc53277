//! 观察者通知
//!
//! 把到达、离开、溢出/丢失记录依次交给内置事件记录器和所有附加的观察者。

use super::Network;
use super::sink::{ArrivalRecord, DepartureRecord, DropRecord, StatisticsSink};

impl Network {
    pub(crate) fn emit_arrival(&mut self, rec: ArrivalRecord) {
        if let Some(log) = &mut self.log {
            log.on_arrival(&rec);
        }
        for sink in &mut self.sinks {
            sink.on_arrival(&rec);
        }
    }

    pub(crate) fn emit_departure(&mut self, rec: DepartureRecord) {
        if let Some(log) = &mut self.log {
            log.on_departure(&rec);
        }
        for sink in &mut self.sinks {
            sink.on_departure(&rec);
        }
    }

    pub(crate) fn emit_drop(&mut self, rec: DropRecord) {
        if let Some(log) = &mut self.log {
            log.on_drop(&rec);
        }
        for sink in &mut self.sinks {
            sink.on_drop(&rec);
        }
    }
}
