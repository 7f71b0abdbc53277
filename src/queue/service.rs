//! 服务时间分布
//!
//! 三种分布的均值都等于 1/rate：指数分布、常数 1/rate、均匀分布 (0, 2/rate]。

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, InvariantViolation};
use crate::sim::SimRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceDistribution {
    #[default]
    Exponential,
    Constant,
    Uniform,
}

impl ServiceDistribution {
    /// 按给定服务率取样一次服务时间。rate 由构造阶段保证严格为正。
    pub fn sample(self, rate: f64, rng: &mut SimRng) -> Result<f64, InvariantViolation> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(InvariantViolation::InvalidRate(rate));
        }
        match self {
            // 理论上可能取到 0，概率可忽略，不做特殊处理
            ServiceDistribution::Exponential => rng.exp(rate),
            ServiceDistribution::Constant => Ok(1.0 / rate),
            ServiceDistribution::Uniform => Ok(rng.unit_open_low() * 2.0 / rate),
        }
    }
}

impl FromStr for ServiceDistribution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exponential" | "expovariate" => Ok(ServiceDistribution::Exponential),
            "constant" => Ok(ServiceDistribution::Constant),
            "uniform" => Ok(ServiceDistribution::Uniform),
            other => Err(ConfigError::UnknownDistribution(other.to_string())),
        }
    }
}

impl fmt::Display for ServiceDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceDistribution::Exponential => f.write_str("exponential"),
            ServiceDistribution::Constant => f.write_str("constant"),
            ServiceDistribution::Uniform => f.write_str("uniform"),
        }
    }
}
