//! 随机数源
//!
//! 整个仿真只使用一个可设定种子的随机数源：到达间隔、客户类型、服务时间都从这里取样，
//! 相同种子 + 相同事件顺序得到逐位一致的结果。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

use crate::error::InvariantViolation;

#[derive(Debug, Clone)]
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// [0, 1) 上的均匀分布
    pub fn unit(&mut self) -> f64 {
        self.inner.r#gen::<f64>()
    }

    /// (0, 1] 上的均匀分布，用于需要严格正值的取样
    pub fn unit_open_low(&mut self) -> f64 {
        1.0 - self.unit()
    }

    /// 指数分布，均值为 1/rate。rate 必须为正，否则返回 `InvalidRate`。
    pub fn exp(&mut self, rate: f64) -> Result<f64, InvariantViolation> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(InvariantViolation::InvalidRate(rate));
        }
        let d = Exp::new(rate).map_err(|_| InvariantViolation::InvalidRate(rate))?;
        Ok(d.sample(&mut self.inner))
    }

    /// 以概率 p 返回 true
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.unit() < p
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::seed_from_u64(0)
    }
}
