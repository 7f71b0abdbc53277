//! 站点统计
//!
//! 站点在自己的事件处理函数里更新这些计数与时间积分，结束时由 `report`
//! 生成可序列化的汇总。

use serde::Serialize;

use crate::net::ClientType;
use crate::sim::SimTime;

/// 按客户类型拆分的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerType<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
}

impl<T> PerType<T> {
    pub fn get(&self, t: ClientType) -> &T {
        match t {
            ClientType::A => &self.a,
            ClientType::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, t: ClientType) -> &mut T {
        match t {
            ClientType::A => &mut self.a,
            ClientType::B => &mut self.b,
        }
    }
}

impl PerType<u64> {
    pub fn total(&self) -> u64 {
        self.a + self.b
    }
}

#[derive(Debug, Clone, Default)]
pub struct StationStats {
    /// 所有到达（含被拒绝的）
    pub arrivals: PerType<u64>,
    pub admitted: PerType<u64>,
    pub departures: PerType<u64>,
    /// 被拒绝后转发到溢出站点
    pub forwarded: PerType<u64>,
    /// 被拒绝且没有溢出路由
    pub lost: PerType<u64>,
    /// 站内客户数对时间的积分
    pub users_time: f64,
    /// 缓冲区占用 max(0, users - servers) 对时间的积分
    pub buffer_time: f64,
    pub last_event: SimTime,
    /// 站内停留时间之和
    pub delay_sum: PerType<f64>,
    /// 等待时间（进入站点到开始服务）之和
    pub waiting_sum: f64,
    pub services_started: u64,
    /// 需要等待（等待时间 > 0）的客户数
    pub waited: u64,
    pub service_time_sum: f64,
    pub max_users: usize,
}

impl StationStats {
    /// 把时间积分推进到 `now`；在状态改变之前调用
    pub fn advance(&mut self, now: SimTime, users: usize, servers: Option<usize>) {
        let dt = now.since(self.last_event);
        if dt > 0.0 {
            self.users_time += users as f64 * dt;
            if let Some(s) = servers {
                self.buffer_time += users.saturating_sub(s) as f64 * dt;
            }
        }
        self.last_event = now;
    }

    pub fn record_service_start(&mut self, waiting: f64, service_time: f64) {
        self.services_started += 1;
        self.waiting_sum += waiting;
        if waiting > 0.0 {
            self.waited += 1;
        }
        self.service_time_sum += service_time;
    }

    pub fn record_departure(&mut self, t: ClientType, delay: f64) {
        *self.departures.get_mut(t) += 1;
        *self.delay_sum.get_mut(t) += delay;
    }
}

/// 站点汇总
#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    pub name: String,
    pub time: f64,
    pub arrivals: PerType<u64>,
    pub admitted: PerType<u64>,
    pub departures: PerType<u64>,
    pub forwarded: PerType<u64>,
    pub lost: PerType<u64>,
    pub users_now: usize,
    pub max_users: usize,
    /// 时间平均站内客户数
    pub avg_users: f64,
    /// 时间平均缓冲区占用
    pub avg_buffer: f64,
    pub avg_delay: f64,
    pub avg_delay_by_type: PerType<f64>,
    /// 平均等待时间（含不需要等待的客户）
    pub avg_waiting: f64,
    /// 平均等待时间（只统计确实等待过的客户）
    pub avg_waiting_nonzero: f64,
    pub avg_service_time: f64,
    /// 被拒绝（转发 + 丢失）的比例
    pub rejection_probability: f64,
    /// 永久丢失的比例
    pub loss_probability: f64,
    pub arrival_rate: f64,
    pub departure_rate: f64,
    pub utilization: Vec<f64>,
    pub total_cost: f64,
    pub double_bookings: usize,
}

pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
