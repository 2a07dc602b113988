//! # Chrome DevTools Protocol (CDP) 层
//!
//! 基于 CDP 的 web 界面驱动：连接到已启动浏览器中的页面，实现 `DriverSession` / `LiveElement`。
//!
//! ## 主要功能
//! - **WebSocket 连接管理**: 命令与响应按 ID 关联，每条命令都有独立超时
//! - **节点注册表**: 查找到的节点保存在页面内的 `window.__harnessRefs` 中，以字符串键引用
//! - **失效检测**: 节点被移除（`isConnected == false`）或页面导航后注册表消失，均返回 `Stale`
//! - **输入事件**: 点击、悬停、拖拽通过 `Input.dispatchMouseEvent`，轻触与滑动通过 `Input.dispatchTouchEvent`
//!
//! ## 模块结构
//! - `traits`: `CdpConnection` 命令通道
//! - `types`: CDP 协议相关的数据类型
//! - `connection`: WebSocket 连接实现
//! - `browser`: 通过 HTTP 端点发现页面并附加
//! - `js`: 页面内执行的脚本
//! - `session`: `CdpSession` / `CdpElement`
//! - `mock`: 用于测试的脚本化连接
//!
//! ## 使用示例
//! ```rust,no_run
//! use chaser_harness::cdp::CdpBrowser;
//! use chaser_harness::driver::DriverSession;
//! use chaser_harness::Locator;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = CdpBrowser::new("http://localhost:9222", Duration::from_secs(30));
//! let session = browser.attach(Some("example.com")).await?;
//!
//! let heading = session.find_element(&Locator::css("h1")?).await?;
//! println!("Heading: {}", heading.text().await?);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod browser;
pub mod js;
pub mod session;
pub mod mock;

#[cfg(test)]
mod tests;

pub use traits::CdpConnection;
pub use types::TargetInfo;
pub use connection::CdpWebSocketConnection;
pub use browser::CdpBrowser;
pub use session::{CdpSession, CdpElement};
pub use mock::MockCdpConnection;
