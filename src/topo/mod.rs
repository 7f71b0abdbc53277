//! 拓扑构建
//!
//! 常用网络形状的构建函数：单站点、边缘/云两级站点，以及 JSON 场景。

pub mod edge_cloud;
pub mod scenario;
pub mod single;
