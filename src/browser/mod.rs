//! 浏览器资源：启动无头浏览器，或连接已有的调试端口

pub mod connection;
pub mod headless;

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 持续驱动浏览器事件循环，直到连接关闭
///
/// 浏览器是长期复用的，单条事件出错（例如新版 Chrome 发来未知的 CDP 消息）
/// 只记录，不能让循环退出，否则之后所有请求都收不到响应。
/// 返回处理过的事件数。
pub async fn drive_events<S, T, E>(mut handler: S) -> usize
where
    S: Stream<Item = Result<T, E>> + Unpin,
    E: Display,
{
    let mut handled = 0;
    while let Some(event) = handler.next().await {
        handled += 1;
        if let Err(e) = event {
            debug!("浏览器事件处理出错（忽略）: {}", e);
        }
    }
    warn!("⚠️ 浏览器事件循环已结束");
    handled
}
