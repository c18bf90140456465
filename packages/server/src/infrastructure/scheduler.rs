//! 接続にひもづく遅延送信
//!
//! 遅延後に 1 接続へイベントを送るタスクを起動します。タスクは接続の
//! `lifetime` トークンに従属し、接続がクローズされた時点で送信せずに終了します。
//! タスクは接続への弱参照しか持たないため、接続の解放を妨げません。

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    config::ScheduledEvent,
    domain::{Connection, EventEmitter},
};

pub fn schedule_deferred<E>(
    connection: &Arc<Connection>,
    emitter: Arc<E>,
    scheduled: ScheduledEvent,
) -> JoinHandle<()>
where
    E: EventEmitter + ?Sized + 'static,
{
    let target = Arc::downgrade(connection);
    let lifetime = connection.lifetime();
    let connection_id = connection.id().clone();

    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = lifetime.cancelled() => {
                tracing::debug!(
                    "Deferred '{}' for '{}' cancelled",
                    scheduled.event.name,
                    connection_id
                );
            }
            _ = tokio::time::sleep(scheduled.delay) => {
                match target.upgrade() {
                    Some(connection) if connection.is_open() => {
                        emitter.emit_to(&connection, &scheduled.event);
                    }
                    _ => {
                        tracing::debug!(
                            "Connection '{}' gone before deferred '{}'",
                            connection_id,
                            scheduled.event.name
                        );
                    }
                }
            }
        }
    })
}
