//! 호출부 명시형 재시도 정책.
//!
//! 최대 시도 수 + 에러 범주 술어 + (선택) 벽시계 마감으로 구성된다.
//! 세션의 즉시 재전송(대기 없음)과 대시보드 폴링(고정 지연) 양쪽이
//! 같은 정책 타입을 쓴다. 한번 시작된 루프에는 취소 수단이 없다 —
//! 예산 소진 또는 성공까지 호출 스레드를 점유한다.

use loadrelay_core::error::CoreError;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::warn;

/// 재시도 정책
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 총 시도 수 (첫 시도 포함, 최소 1)
    pub max_attempts: u32,
    /// 시도 간 대기 시간 (0이면 즉시 재시도)
    pub delay: Duration,
    /// 전체 벽시계 한도 — 초과 시 남은 예산과 무관하게 중단
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    /// 대기 없는 정책 생성
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
            deadline: None,
        }
    }

    /// 시도 간 대기 설정
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 벽시계 마감 설정
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// `retryable`이 참인 에러만 재시도하며 `op`를 실행한다.
    ///
    /// 마지막 에러를 그대로 돌려준다 — 호출부가 실패 분류를 잃지 않는다.
    pub async fn run<T, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
        P: Fn(&CoreError) -> bool,
    {
        let started = Instant::now();

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !retryable(&e) || attempt == self.max_attempts {
                        return Err(e);
                    }
                    if let Some(deadline) = self.deadline {
                        if started.elapsed() >= deadline {
                            warn!("재시도 마감 초과 ({deadline:?}), 중단: {e}");
                            return Err(e);
                        }
                    }
                    warn!("시도 {attempt}/{} 실패: {e}, 재시도", self.max_attempts);
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        // max_attempts >= 1이므로 도달 불가
        Err(CoreError::Internal("재시도 루프 이탈".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::attempts(5)
            .run(
                || {
                    calls.fetch_add(1, Ordering::Relaxed);
                    async { Ok::<_, CoreError>(7) }
                },
                CoreError::is_transient,
            )
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn exhausts_budget_on_transient_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::attempts(6)
            .run(
                || {
                    calls.fetch_add(1, Ordering::Relaxed);
                    async { Err(CoreError::Network("refused".to_string())) }
                },
                CoreError::is_transient,
            )
            .await;
        assert!(result.is_err());
        // 첫 시도 + 5회 추가 재시도
        assert_eq!(calls.load(Ordering::Relaxed), 6);
    }

    #[tokio::test]
    async fn non_retryable_propagates_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::attempts(6)
            .run(
                || {
                    calls.fetch_add(1, Ordering::Relaxed);
                    async { Err(CoreError::Auth("denied".to_string())) }
                },
                CoreError::is_transient,
            )
            .await;
        assert!(matches!(result, Err(CoreError::Auth(_))));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::attempts(6)
            .run(
                || {
                    let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
                    async move {
                        if n < 3 {
                            Err(CoreError::Network("flaky".to_string()))
                        } else {
                            Ok(n)
                        }
                    }
                },
                CoreError::is_transient,
            )
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn deadline_stops_before_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::attempts(100)
            .with_delay(Duration::from_millis(20))
            .with_deadline(Duration::from_millis(1));
        let result: Result<(), _> = policy
            .run(
                || {
                    calls.fetch_add(1, Ordering::Relaxed);
                    async {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Err(CoreError::Network("slow".to_string()))
                    }
                },
                CoreError::is_transient,
            )
            .await;
        assert!(result.is_err());
        assert!(calls.load(Ordering::Relaxed) < 100);
    }
}
