//! 时间工具函数
//!
//! 全部时间戳统一使用 UTC Unix 时间，存储层只接收 `i64`。

/// 当前 Unix 时间戳 (毫秒)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 当前 Unix 时间戳 (秒)
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
