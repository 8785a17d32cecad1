//! 메트릭 수집 클라이언트.
//!
//! `MetricIngest` 포트 구현. 레코드 배치를 수집 엔드포인트 게이지 형식으로
//! 변환해 전송한다. 단일 시도만 담당한다 — 재시도 예산은 세션 소유.

use async_trait::async_trait;
use loadrelay_core::error::CoreError;
use loadrelay_core::models::metric::{MetricRecord, TagMap};
use loadrelay_core::ports::MetricIngest;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// 에러 본문 로그 길이 제한
const BODY_SNIPPET_LEN: usize = 256;

/// 게이지 레코드의 wire 형식
#[derive(Debug, Serialize)]
struct GaugeBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    metric_type: &'static str,
    value: f64,
    /// 밀리초 에포크 — 레코드의 종료 시각
    timestamp: u64,
    attributes: &'a TagMap,
}

/// 수집 엔드포인트가 기대하는 배치 봉투: `[{"metrics": [...]}]`
#[derive(Debug, Serialize)]
struct MetricEnvelope<'a> {
    metrics: Vec<GaugeBody<'a>>,
}

/// 수집 API 클라이언트 — `MetricIngest` 포트 구현
pub struct MetricApiClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl MetricApiClient {
    /// 새 수집 클라이언트 생성. 구성 실패는 치명적 에러로 구분된다.
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::ClientConstruction(format!("수집 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// 전송 계층 실패를 일시적 네트워크 에러로 분류.
    /// I/O, TLS, DNS, 연결, 읽기 타임아웃 전부 reqwest 전송 에러로 나타난다.
    fn transport_error(context: &str, e: reqwest::Error) -> CoreError {
        CoreError::Network(format!("{context}: {e}"))
    }

    async fn post_envelope(&self, envelope: &[MetricEnvelope<'_>]) -> Result<(), CoreError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", &self.token)
            .json(envelope)
            .send()
            .await
            .map_err(|e| Self::transport_error("수집 요청 실패", e))?;

        let status = resp.status();
        if status.as_u16() >= 300 {
            let mut body = resp
                .text()
                .await
                .map_err(|e| Self::transport_error("응답 본문 읽기 실패", e))?;
            body.truncate(BODY_SNIPPET_LEN);
            return Err(CoreError::BadResponse {
                status: status.as_u16(),
                body,
            });
        }

        debug!("수집 API 응답: {status}");
        Ok(())
    }
}

#[async_trait]
impl MetricIngest for MetricApiClient {
    async fn probe(&self) -> Result<(), CoreError> {
        self.post_envelope(&[MetricEnvelope {
            metrics: Vec::new(),
        }])
        .await
    }

    async fn send_batch(&self, records: &[MetricRecord]) -> Result<(), CoreError> {
        let metrics = records
            .iter()
            .map(|r| GaugeBody {
                name: &r.name,
                metric_type: "gauge",
                value: r.value,
                timestamp: r.end_time_ms,
                attributes: &r.tags,
            })
            .collect();

        debug!("배치 전송: {}개 레코드", records.len());
        self.post_envelope(&[MetricEnvelope { metrics }]).await
    }
}
