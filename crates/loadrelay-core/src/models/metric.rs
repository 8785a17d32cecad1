//! 메트릭 레코드 모델.
//!
//! 수집 엔드포인트로 전송되는 평탄화된 게이지 레코드와,
//! 플러시된 윈도우 전체에 걸친 타임스탬프 경계를 정의한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 태그 집합 — 문자열과 숫자 값이 섞인다 (`label`은 문자열, `timestamp`는 숫자)
pub type TagMap = BTreeMap<String, serde_json::Value>;

/// 게이지 메트릭 레코드. 전송 직전 생성되며 이후 변경되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    /// 메트릭 이름 (예: "requests-per-second")
    pub name: String,
    /// 수치 값
    pub value: f64,
    /// 태그 집합 (기본 태그 + label + timestamp)
    pub tags: TagMap,
    /// 종료 시각 (밀리초)
    pub end_time_ms: u64,
}

impl MetricRecord {
    /// 게이지 레코드 생성
    pub fn gauge(name: &str, value: f64, tags: TagMap, end_time_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            value,
            tags,
            end_time_ms,
        }
    }
}

/// 플러시된 윈도우 전체의 최소/최대 타임스탬프 경계.
///
/// `first_ts`는 단조 비증가, `last_ts`는 단조 비감소 — 한 번 관측된
/// 경계는 더 넓어질 수만 있다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBounds {
    first_ts: Option<u64>,
    last_ts: Option<u64>,
}

impl TimeBounds {
    /// 타임스탬프 하나를 경계에 반영
    pub fn observe(&mut self, ts: u64) {
        self.first_ts = Some(self.first_ts.map_or(ts, |cur| cur.min(ts)));
        self.last_ts = Some(self.last_ts.map_or(ts, |cur| cur.max(ts)));
    }

    /// 지금까지 관측된 최소 타임스탬프
    pub fn first_ts(&self) -> Option<u64> {
        self.first_ts
    }

    /// 지금까지 관측된 최대 타임스탬프
    pub fn last_ts(&self) -> Option<u64> {
        self.last_ts
    }
}
