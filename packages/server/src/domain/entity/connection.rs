//! Connection エンティティ
//!
//! 1 つのリモートピアとの双方向チャネルを表します。送信はチャネルへの
//! enqueue のみで、実際の書き込みはトランスポート側のタスクが行います。
//!
//! 状態遷移: `Connecting → Open → Closed`（`Closed` は終端）

use std::{
    fmt,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU8, Ordering},
    },
};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    error::ConnectionError,
    value_object::{ConnectionId, Timestamp},
};

use super::event::Event;

/// 接続ごとの送信チャネル
pub type OutboundSender = mpsc::UnboundedSender<Event>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<Event>;

pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closed => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            _ => Self::Closed,
        }
    }
}

pub struct Connection {
    id: ConnectionId,
    connected_at: Timestamp,
    state: AtomicU8,
    /// close 時に drop される（受信側の pusher ループが終了する）
    outbound: Mutex<Option<OutboundSender>>,
    /// close で cancel される。遅延送信などの接続スコープのタスクが参照する
    lifetime: CancellationToken,
}

impl Connection {
    pub fn new(id: ConnectionId, connected_at: Timestamp, outbound: OutboundSender) -> Self {
        Self {
            id,
            connected_at,
            state: AtomicU8::new(ConnectionState::Connecting.as_u8()),
            outbound: Mutex::new(Some(outbound)),
            lifetime: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// ハンドシェイク完了: `Connecting → Open`
    ///
    /// `Connecting` 以外の状態からは遷移せず `false` を返す。
    pub fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Connecting.as_u8(),
                ConnectionState::Open.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// イベントを送信キューに積む（ブロックしない）
    ///
    /// # Errors
    ///
    /// 接続が閉じている、またはトランスポート側の受信端が既に無い場合は
    /// `ConnectionError::ConnectionClosed`
    pub fn send(&self, event: Event) -> Result<(), ConnectionError> {
        if self.state() == ConnectionState::Closed {
            return Err(ConnectionError::ConnectionClosed(self.id.clone()));
        }

        let outbound = self.outbound.lock().unwrap_or_else(PoisonError::into_inner);
        match outbound.as_ref() {
            Some(sender) => sender
                .send(event)
                .map_err(|_| ConnectionError::ConnectionClosed(self.id.clone())),
            None => Err(ConnectionError::ConnectionClosed(self.id.clone())),
        }
    }

    /// `Closed` に遷移し、送信チャネルを解放する
    ///
    /// 何度呼んでもよい。実際に遷移させた 1 回だけ `true` を返す。
    pub fn close(&self) -> bool {
        self.close_with(None)
    }

    /// `close` と同じだが、遷移させた呼び出しだけが最後のイベントを積んでからチャネルを解放する
    ///
    /// 同時に閉じようとしても `final_event` が届くのは 1 回だけ。
    pub fn close_with(&self, final_event: Option<Event>) -> bool {
        let previous = self
            .state
            .swap(ConnectionState::Closed.as_u8(), Ordering::AcqRel);
        if ConnectionState::from_u8(previous) == ConnectionState::Closed {
            return false;
        }

        let sender = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let (Some(sender), Some(event)) = (sender, final_event) {
            // 受信側が既に無ければ捨てる
            let _ = sender.send(event);
        }
        self.lifetime.cancel();
        true
    }

    /// 接続が閉じるまで待機する
    pub async fn closed(&self) {
        self.lifetime.cancelled().await;
    }

    /// 接続の寿命に紐づいたトークン
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
