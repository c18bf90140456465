//! イベント配信（ファンアウト）の実装
//!
//! `EventEmitter` / `EventDispatcher` trait の具体的な実装を提供します。
//!
//! - `fanout`: Registry のスナップショットに対して接続ごとの送信チャネルへ配る実装

pub mod fanout;

pub use fanout::FanoutDispatcher;
