use std::time::Duration;

/// 引擎配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | NOTIFICATION_TTL_SECS | 86400 | 通知保留时间 (秒) |
/// | AGGREGATION_WINDOW_SECS | 10 | 通知聚合窗口 (秒) |
/// | UNREAD_LIST_LIMIT | 50 | 未读列表默认上限 |
/// | ENVIRONMENT | development | 运行环境 |
#[derive(Debug, Clone)]
pub struct Config {
    /// 通知记录与未读索引的保留时间 (秒)
    pub notification_ttl_secs: u64,
    /// 同一 (类型, 实体) 通知的聚合窗口 (秒)
    pub aggregation_window_secs: u64,
    /// 未读通知列表的默认上限
    pub unread_list_limit: usize,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            notification_ttl_secs: std::env::var("NOTIFICATION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24 * 60 * 60),
            aggregation_window_secs: std::env::var("AGGREGATION_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            unread_list_limit: std::env::var("UNREAD_LIST_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 通知保留时间
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }

    /// 聚合窗口
    pub fn aggregation_window(&self) -> Duration {
        Duration::from_secs(self.aggregation_window_secs)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config {
            notification_ttl_secs: 24 * 60 * 60,
            aggregation_window_secs: 10,
            unread_list_limit: 50,
            environment: "development".into(),
        };
        assert_eq!(config.notification_ttl(), Duration::from_secs(86400));
        assert_eq!(config.aggregation_window(), Duration::from_secs(10));
        assert!(!config.is_production());
    }
}
