//! 메트릭 전송 세션.
//!
//! 수집 포트를 감싸 배치 전송에 재시도 예산을 적용한다. 일시적 네트워크
//! 문제만 즉시 재시도(대기 없음, 기본 5회 추가 시도)하고 나머지는 그대로
//! 전파한다. `&mut self` 수신자가 세션당 동시 전송 1건을 보장한다.
//! 수명은 업로더 실행 1회 — prepare에서 생성, post_process에서 close.

use loadrelay_core::error::CoreError;
use loadrelay_core::models::metric::MetricRecord;
use loadrelay_core::ports::MetricIngest;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::retry::RetryPolicy;

/// 기본 추가 재시도 횟수
const DEFAULT_RETRY_LIMIT: u32 = 5;

/// 재시도 루프 전체의 벽시계 한도 — 요청이 번갈아 타임아웃에 걸려도
/// 한 배치가 호출부를 이 이상 점유하지 않는다
const SEND_DEADLINE: Duration = Duration::from_secs(120);

/// 전송 세션 — 수집 포트 + 재시도 예산 + 1회성 close
pub struct TransportSession {
    ingest: Arc<dyn MetricIngest>,
    retry_limit: u32,
    closed: bool,
}

impl TransportSession {
    /// 새 세션 생성
    pub fn new(ingest: Arc<dyn MetricIngest>) -> Self {
        Self {
            ingest,
            retry_limit: DEFAULT_RETRY_LIMIT,
            closed: false,
        }
    }

    /// 추가 재시도 횟수 설정
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// 연결성 확인 — 기동 시 1회 호출, 실패는 치명적
    pub async fn probe(&self) -> Result<(), CoreError> {
        self.ingest.probe().await
    }

    /// 배치 전송. 일시적 네트워크 실패는 예산 소진까지 즉시 재시도.
    pub async fn send_batch(&mut self, records: &[MetricRecord]) -> Result<(), CoreError> {
        if self.closed {
            return Err(CoreError::Internal("닫힌 세션으로 전송 시도".to_string()));
        }

        let ingest = Arc::clone(&self.ingest);
        RetryPolicy::attempts(self.retry_limit + 1)
            .with_deadline(SEND_DEADLINE)
            .run(|| ingest.send_batch(records), CoreError::is_transient)
            .await
    }

    /// 세션 종료. 멱등 — 두 번째 호출부터는 아무 일도 하지 않는다.
    pub fn close(&mut self) {
        if !self.closed {
            debug!("전송 세션 종료");
            self.closed = true;
        }
    }

    /// 종료 여부
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
