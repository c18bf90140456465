//! Domain logic for client-side operations.
//!
//! 接続が切れたときに再接続するかどうかの判断をまとめる。副作用は持たない。

use std::time::Duration;

use kairo_server::usecase::CloseReason;

use crate::error::ClientError;

/// 再接続しても結果が変わらない終わり方かどうか
///
/// ハンドシェイク拒否と、自分から切断を頼んだ場合は再接続しない。
/// サーバー停止などそれ以外の `disconnect` は再接続の対象。
pub fn should_exit_immediately(error: &ClientError) -> bool {
    match error {
        ClientError::Rejected(_) => true,
        ClientError::Disconnected(reason) => reason == CloseReason::ClientRequested.as_str(),
        ClientError::ConnectionError(_) => false,
    }
}

/// 再接続の回数と間隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(5),
        }
    }
}

impl ReconnectPolicy {
    /// 次の接続を試すまでの待ち時間。`None` ならあきらめる
    ///
    /// `attempt` はこれまでに失敗したセッションの数（1 始まり）。
    pub fn next_delay(&self, error: &ClientError, attempt: u32) -> Option<Duration> {
        if should_exit_immediately(error) || attempt >= self.max_attempts {
            return None;
        }
        Some(self.interval)
    }
}
