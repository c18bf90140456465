//! Room Registry の実装
//!
//! - `inmemory`: 単一プロセス内の HashMap / BTreeMap 実装
//! - クロスノードのアダプタは提供しない

pub mod inmemory;

pub use inmemory::InMemoryRoomRegistry;
