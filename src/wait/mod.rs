//! # 条件等待
//!
//! 在固定节奏下反复评估就绪条件，直到条件成立、出现不可恢复错误或超出时间预算。
//!
//! ## 主要组成
//! - **Condition**: 只读的就绪谓词（可见、可点击、文本相等、地址包含、脚本返回真等）
//! - **Poller**: 轮询循环，使用单调时钟计时
//! - **Outcome**: 成功 / 超时 / 中止 / 动作失败，附带等待上下文

pub mod condition;
pub mod outcome;
pub mod poller;


pub use condition::{Condition, Evaluation};
pub use outcome::{Outcome, WaitContext};
pub use poller::{PollSpec, Poller, DEFAULT_POLL_INTERVAL};
