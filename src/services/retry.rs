//! 重试策略
//!
//! 只对临时错误（429 / 5xx）重试，等待时间从 `initial_delay` 开始每次翻倍

use crate::config::Config;
use crate::error::ProviderResult;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// 指数退避重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次调用之外最多再试几次
    pub max_retries: u32,
    /// 第一次重试前的等待时间
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.retry_base_delay(),
        }
    }

    /// 第 `retry` 次重试（从 0 开始）前的等待时间
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay.saturating_mul(1u32 << retry.min(16))
    }
}

/// 带重试地执行 `op`
///
/// 非临时错误立即返回；重试次数用尽后返回最后一次的错误
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                warn!(
                    "{} 遇到临时错误 ({}), {:?} 后重试 ({}/{})",
                    label,
                    e,
                    delay,
                    retry + 1,
                    policy.max_retries
                );
                sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn status(code: u16) -> ProviderError {
        ProviderError::Status {
            status: code,
            message: "test".to_string(),
        }
    }

    /// 暂停时钟下计时器按毫秒取整
    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "期望 {:?}，实际 {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_delay_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(2), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_rate_limit_then_succeeds() {
        let policy = RetryPolicy::default();
        let attempts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let result = with_retry(&policy, "test", || {
            let attempts = attempts.clone();
            async move {
                let mut attempts = attempts.lock().unwrap();
                attempts.push(Instant::now());
                if attempts.len() <= 2 {
                    Err(status(429))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");

        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts.len(), 3, "应该在 2 次重试后成功");
        assert_close(attempts[1] - attempts[0], Duration::from_secs(2));
        assert_close(attempts[2] - attempts[1], Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(Mutex::new(0));
        let started = Instant::now();

        let result: ProviderResult<()> = with_retry(&policy, "test", || {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Err(status(400))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().status_code(), Some(400));
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_last_error() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(Mutex::new(0u16));
        let started = Instant::now();

        let result: ProviderResult<()> = with_retry(&policy, "test", || {
            let calls = calls.clone();
            async move {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                Err(status(500 + *calls))
            }
        })
        .await;

        // 1 次首调 + 3 次重试
        assert_eq!(*calls.lock().unwrap(), 4);
        assert_eq!(result.unwrap_err().status_code(), Some(504));
        assert_close(started.elapsed(), Duration::from_secs(2 + 4 + 8));
    }

    #[tokio::test]
    async fn test_schema_error_is_not_retried() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::ZERO,
        };
        let calls = Arc::new(Mutex::new(0));

        let result: ProviderResult<()> = with_retry(&policy, "test", || {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Err(ProviderError::schema("missing field `website`"))
            }
        })
        .await;

        tokio_test::assert_err!(result);
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
