//! 데이터포인트 직렬화기.
//!
//! 샘플 윈도우 시퀀스를 평탄한 게이지 레코드 목록으로 변환한다.
//! 시간값은 배율(기본 1000, 초→밀리초)로 정규화하고, 부수 효과로
//! 공유 타임스탬프 경계를 갱신한다.

use loadrelay_core::models::metric::{MetricRecord, TagMap, TimeBounds};
use loadrelay_core::models::sample::{KpiSet, SampleWindow};
use tracing::debug;

/// 빈 레이블을 대신하는 센티널
pub const OVERALL_LABEL: &str = "OVERALL";

/// 최소 응답 시간으로 쓰는 백분위 키
const PERCENTILE_MIN: &str = "0.0";
/// 최대 응답 시간으로 쓰는 백분위 키
const PERCENTILE_MAX: &str = "100.0";

/// 윈도우 → 레코드 평탄화기
#[derive(Debug, Clone, Copy)]
pub struct DatapointSerializer {
    multiplier: u64,
}

impl Default for DatapointSerializer {
    fn default() -> Self {
        Self { multiplier: 1_000 }
    }
}

impl DatapointSerializer {
    /// 지정 배율로 생성
    pub fn new(multiplier: u64) -> Self {
        Self { multiplier }
    }

    /// 현재 배율
    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// 윈도우 시퀀스를 레코드 목록으로 평탄화.
    ///
    /// 레코드 태그 = `base_tags` 복사본 + `label` + `timestamp`.
    /// 빈 입력은 빈 목록을 돌려주고 `bounds`를 건드리지 않는다.
    pub fn serialize(
        &self,
        windows: &[SampleWindow],
        base_tags: &TagMap,
        bounds: &mut TimeBounds,
    ) -> Vec<MetricRecord> {
        let mut records = Vec::new();

        for window in windows {
            bounds.observe(window.timestamp);
            let end_time_ms = window.timestamp * self.multiplier;

            for (label, kpi) in &window.current {
                let tags = self.label_tags(base_tags, label, end_time_ms);
                self.emit_current(kpi, end_time_ms, &tags, &mut records);
            }

            for (label, kpi) in &window.cumulative {
                let tags = self.label_tags(base_tags, label, end_time_ms);
                self.emit_cumulative(kpi, end_time_ms, &tags, &mut records);
            }
        }

        debug!("직렬화 완료: {}개 레코드", records.len());
        records
    }

    /// 레이블별 태그 집합 — 교차 오염을 피하려고 매 레이블 새로 복사한다
    fn label_tags(&self, base_tags: &TagMap, label: &str, end_time_ms: u64) -> TagMap {
        let mut tags = base_tags.clone();
        let label = if label.is_empty() {
            OVERALL_LABEL
        } else {
            label
        };
        tags.insert("label".to_string(), label.into());
        tags.insert("timestamp".to_string(), end_time_ms.into());
        tags
    }

    fn scale(&self, seconds: f64) -> f64 {
        seconds * self.multiplier as f64
    }

    /// 현재 구간: 고정 메트릭 + 백분위 + 응답 코드
    fn emit_current(
        &self,
        kpi: &KpiSet,
        end_time_ms: u64,
        tags: &TagMap,
        out: &mut Vec<MetricRecord>,
    ) {
        let min = kpi
            .percentiles
            .get(PERCENTILE_MIN)
            .map_or(0.0, |v| self.scale(*v));
        let max = kpi
            .percentiles
            .get(PERCENTILE_MAX)
            .map_or(0.0, |v| self.scale(*v));

        let fixed = [
            ("requests-per-second", kpi.sample_count as f64),
            ("active-threads", kpi.concurrency as f64),
            ("failure-count", kpi.failures as f64),
            ("min-response-time", min),
            ("max-response-time", max),
            ("avg-response-time", self.scale(kpi.avg_response_time)),
            ("avg-latency", self.scale(kpi.avg_latency)),
            ("avg-connect-time", self.scale(kpi.avg_connect_time)),
        ];
        for (name, value) in fixed {
            out.push(MetricRecord::gauge(name, value, tags.clone(), end_time_ms));
        }

        for (p, value) in &kpi.percentiles {
            out.push(MetricRecord::gauge(
                &format!("percentile-{p}"),
                self.scale(*value),
                tags.clone(),
                end_time_ms,
            ));
        }

        for (code, count) in &kpi.response_codes {
            let mut code_tags = tags.clone();
            code_tags.insert("response-code".to_string(), code.as_str().into());
            out.push(MetricRecord::gauge(
                "response-code-count",
                *count as f64,
                code_tags,
                end_time_ms,
            ));
        }
    }

    /// 누적 구간: 백분위만, 현재 구간과 접두사로 구분
    fn emit_cumulative(
        &self,
        kpi: &KpiSet,
        end_time_ms: u64,
        tags: &TagMap,
        out: &mut Vec<MetricRecord>,
    ) {
        for (p, value) in &kpi.percentiles {
            out.push(MetricRecord::gauge(
                &format!("cumulative-percentile-{p}"),
                self.scale(*value),
                tags.clone(),
                end_time_ms,
            ));
        }
    }
}
