//! 識別子の生成

use uuid::Uuid;

use super::value_object::ConnectionId;

/// ConnectionId のファクトリ
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// UUID v4 を使って新しい接続 ID を生成
    pub fn generate() -> ConnectionId {
        ConnectionId::from(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        // テスト項目: 生成される ID は毎回異なる
        // given (前提条件) / when (操作):
        let first = ConnectionIdFactory::generate();
        let second = ConnectionIdFactory::generate();

        // then (期待する結果):
        assert_ne!(first, second);
        assert!(Uuid::parse_str(first.as_str()).is_ok());
    }
}
