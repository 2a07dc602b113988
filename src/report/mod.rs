//! # 结果上报
//!
//! 把等待与动作的结构化结果转换为宿主测试框架的通过 / 失败信号。
//!
//! - **OutcomeReporter**: 成功不做任何事，其余结果生成一条包含条件、目标、耗时与最后观察值的消息
//! - **FailureSink**: 唯一的失败出口（panic、记录或仅日志）
//! - **TestMetadata**: 显式传入的测试元数据，替代调用栈反射

pub mod reporter;
pub mod sink;


pub use reporter::{OutcomeReporter, TestMetadata};
pub use sink::{FailureRecord, FailureSink, PanicSink, RecordingSink, TracingSink};
