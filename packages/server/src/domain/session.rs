//! プロセス全体のセッションカウンタ

use std::sync::atomic::{AtomicUsize, Ordering};

/// 現在開いている接続数
///
/// サーバー起動時に生成し、`Arc` で接続・切断のユースケースに渡す。
#[derive(Debug, Default)]
pub struct SessionCounter {
    open: AtomicUsize,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1 増やし、増やした後の値を返す
    pub fn increment(&self) -> usize {
        self.open.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// 1 減らし、減らした後の値を返す（0 未満にはならない）
    pub fn decrement(&self) -> usize {
        match self
            .open
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }

    pub fn current(&self) -> usize {
        self.open.load(Ordering::Acquire)
    }
}
