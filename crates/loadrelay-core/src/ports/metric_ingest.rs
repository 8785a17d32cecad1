//! 메트릭 수집 포트.
//!
//! 구현: `loadrelay-network` crate (reqwest). 재시도는 여기 없다 —
//! 단일 전송 시도만 정의하고, 재시도 예산은 세션이 소유한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metric::MetricRecord;

/// 메트릭 수집 클라이언트
#[async_trait]
pub trait MetricIngest: Send + Sync {
    /// 연결성 확인 — 최소 페이로드 전송, HTTP >= 300이면 실패
    async fn probe(&self) -> Result<(), CoreError>;

    /// 배치 1회 전송 시도. 일시적 네트워크 문제는
    /// `CoreError::Network`로 분류해 돌려준다.
    async fn send_batch(&self, records: &[MetricRecord]) -> Result<(), CoreError>;
}
