//! 进程级共享状态
//!
//! 所有跨组件资源 (KV 连接、订单账本、通知服务) 都在这里显式注入，
//! 生命周期为: 启动时 initialize → 运行期 health_check → 关停时 shutdown。
//! 不使用任何隐藏全局量。

use crate::bridge::OrderEventBridge;
use crate::core::Config;
use crate::kv::KvStore;
use crate::ledger::{Catalog, OrderLedger, OrderStore};
use crate::notify::NotificationAggregator;
use parking_lot::Mutex;
use shared::error::{DomainError, DomainResult};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Engine state holding every shared component
pub struct AppState {
    /// 引擎配置
    pub config: Config,
    /// KV 连接 (通知存储)
    pub kv: Arc<dyn KvStore>,
    /// 订单账本
    pub ledger: Arc<OrderLedger>,
    /// 通知服务
    pub notifications: Arc<NotificationAggregator>,
    /// 事件桥接 worker
    bridge_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Wire the components together and start the bridge worker
    ///
    /// Fails fast when the KV store does not answer the initial ping.
    pub async fn initialize(
        config: Config,
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn Catalog>,
        kv: Arc<dyn KvStore>,
    ) -> DomainResult<Self> {
        kv.ping()
            .await
            .map_err(|err| DomainError::infra(format!("kv store unavailable: {err}")))?;

        let ledger = Arc::new(OrderLedger::new(store, catalog));
        let notifications = Arc::new(NotificationAggregator::new(
            kv.clone(),
            config.notification_ttl(),
            config.aggregation_window(),
        ));
        let bridge = Arc::new(OrderEventBridge::new(notifications.clone()));
        let bridge_task = bridge.spawn(ledger.subscribe());

        tracing::info!(environment = %config.environment, "comanda engine initialized");
        Ok(Self {
            config,
            kv,
            ledger,
            notifications,
            bridge_task: Mutex::new(Some(bridge_task)),
        })
    }

    /// Health check against the KV store
    pub async fn health_check(&self) -> DomainResult<()> {
        self.kv
            .ping()
            .await
            .map_err(|err| DomainError::infra(format!("kv store unavailable: {err}")))
    }

    /// Stop the bridge worker; order and notification data are untouched
    pub async fn shutdown(&self) {
        let task = self.bridge_task.lock().take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }
        tracing::info!("comanda engine stopped");
    }
}
