//! # 驱动边界层
//!
//! 定义核心同步引擎与具体界面驱动（浏览器 DOM 或移动端视图树）之间的能力接口。
//!
//! ## 主要功能
//! - **DriverSession**: 按定位器查找节点、执行脚本、读取当前地址
//! - **LiveElement**: 单个节点的活引用，节点被销毁或替换后任何调用都返回 `Stale`
//! - **mock**: 可编程的内存界面，用于测试轮询、失效恢复与动作执行
//!
//! 每种界面驱动只实现一次这组接口，`ElementHandle` 不区分 web 与 mobile。

pub mod traits;
pub mod mock;

pub use traits::{
    DriverSession, LiveElement, ElementRect, EvaluationResult, SwipeDirection,
};

pub use mock::{MockSession, MockElement, MockNode};
