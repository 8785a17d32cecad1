//! 샘플 윈도우 모델.
//!
//! 업스트림 집계기가 1회 집계 주기마다 생성하는 측정값 묶음.
//! 생성 이후 불변이며 업로더는 플러시 전까지만 버퍼에 보관한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 레이블 하나의 통계 집합 — 이 시스템에서는 읽기 전용
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiSet {
    /// 구간 내 샘플 수
    pub sample_count: u64,
    /// 동시 사용자(스레드) 수
    pub concurrency: u64,
    /// 실패 수
    pub failures: u64,
    /// 평균 응답 시간 (초)
    pub avg_response_time: f64,
    /// 평균 레이턴시 (초)
    pub avg_latency: f64,
    /// 평균 연결 시간 (초)
    pub avg_connect_time: f64,
    /// 백분위 이름 → 값 (초). 키는 "0.0", "50.0", "100.0" 형식
    pub percentiles: BTreeMap<String, f64>,
    /// 응답 코드 → 발생 횟수
    pub response_codes: BTreeMap<String, u64>,
}

/// 샘플 윈도우 — 한 시점의 주기적 집계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleWindow {
    /// 윈도우 타임스탬프 (초)
    pub timestamp: u64,
    /// 레이블 → 현재 구간 통계
    pub current: BTreeMap<String, KpiSet>,
    /// 레이블 → 시작 이후 누적 통계
    pub cumulative: BTreeMap<String, KpiSet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let mut kpi = KpiSet {
            sample_count: 42,
            concurrency: 10,
            failures: 1,
            avg_response_time: 0.120,
            avg_latency: 0.080,
            avg_connect_time: 0.015,
            ..KpiSet::default()
        };
        kpi.percentiles.insert("50.0".to_string(), 0.110);
        kpi.response_codes.insert("200".to_string(), 41);

        let mut window = SampleWindow {
            timestamp: 1_700_000_000,
            ..SampleWindow::default()
        };
        window.current.insert("checkout".to_string(), kpi);

        let json = serde_json::to_string(&window).unwrap();
        let back: SampleWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, 1_700_000_000);
        assert_eq!(back.current["checkout"].sample_count, 42);
        assert_eq!(back.current["checkout"].percentiles["50.0"], 0.110);
    }
}
