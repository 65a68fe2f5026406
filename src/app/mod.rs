//! 应用核心模块
//!
//! ## 模块结构
//! - `bootstrap` - 应用启动引导（设置加载、状态初始化）
//! - `runner` - 应用运行器（启动 HTTP 服务并等待退出信号）

pub mod bootstrap;
pub mod runner;

pub use runner::run;
