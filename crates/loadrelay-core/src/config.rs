//! 리포터 설정 구조체.
//!
//! 전송 주기, 프로젝트 이름, 엔드포인트, 토큰 소스 등 호스트 엔진이
//! 넘겨주는 설정을 정의한다. JSON 파일에서 로드하거나 호스트가 필드
//! 단위로 채워 넣는다. 키는 kebab-case (`send-interval`, `api-token-file`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::CoreError;

/// 브라우저 자동 열기 시점
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserOpen {
    /// 열지 않음 (기본값)
    #[default]
    None,
    /// 테스트 시작 시
    Start,
    /// 테스트 종료 시
    End,
    /// 시작과 종료 모두
    Both,
}

impl BrowserOpen {
    /// 시작 시점에 열어야 하는지
    pub fn at_start(self) -> bool {
        matches!(self, BrowserOpen::Start | BrowserOpen::Both)
    }

    /// 종료 시점에 열어야 하는지
    pub fn at_end(self) -> bool {
        matches!(self, BrowserOpen::End | BrowserOpen::Both)
    }
}

/// 리포터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReporterConfig {
    /// 버퍼 플러시 주기 (초)
    #[serde(default = "default_send_interval_secs")]
    pub send_interval: u64,
    /// 브라우저 자동 열기 시점
    #[serde(default)]
    pub browser_open: BrowserOpen,
    /// 프로젝트 이름 — 대시보드 이름과 `project` 태그에 사용
    #[serde(default = "default_project")]
    pub project: String,
    /// 모든 메트릭 레코드에 주입되는 사용자 정의 태그
    #[serde(default)]
    pub custom_tags: BTreeMap<String, String>,
    /// 시간값 배율 — 초 단위 원본을 밀리초로 정규화 (기본 1000)
    #[serde(default = "default_report_times_multiplier")]
    pub report_times_multiplier: u64,
    /// 테스트 종료 후 PDF 스냅샷 생성 여부
    #[serde(default)]
    pub static_report: bool,
    /// 관리용 GraphQL 엔드포인트
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// 메트릭 수집 엔드포인트
    #[serde(default = "default_ingest_endpoint")]
    pub ingest_endpoint: String,
    /// 계정 ID — 비어 있으면 API로 자동 탐색
    #[serde(default)]
    pub account_id: String,
    /// 대시보드 생성 mutation 템플릿 파일 경로
    #[serde(default)]
    pub dashboard_template_path: Option<PathBuf>,
    /// HTTP 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
    /// 수집 토큰 (설정 직접 지정)
    #[serde(default)]
    pub token: Option<String>,
    /// 수집 토큰 파일 경로
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// 관리 API 토큰 (설정 직접 지정)
    #[serde(default)]
    pub api_token: Option<String>,
    /// 관리 API 토큰 파일 경로
    #[serde(default)]
    pub api_token_file: Option<PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            send_interval: default_send_interval_secs(),
            browser_open: BrowserOpen::None,
            project: default_project(),
            custom_tags: BTreeMap::new(),
            report_times_multiplier: default_report_times_multiplier(),
            static_report: false,
            api_endpoint: default_api_endpoint(),
            ingest_endpoint: default_ingest_endpoint(),
            account_id: String::new(),
            dashboard_template_path: None,
            timeout: default_timeout_secs(),
            token: None,
            token_file: None,
            api_token: None,
            api_token_file: None,
        }
    }
}

impl ReporterConfig {
    /// JSON 파일에서 설정 로드. 누락 필드는 기본값으로 채운다.
    pub fn load_from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 엔드포인트 URL 형식 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        Url::parse(&self.api_endpoint)
            .map_err(|e| CoreError::Config(format!("api-endpoint 형식 오류: {e}")))?;
        Url::parse(&self.ingest_endpoint)
            .map_err(|e| CoreError::Config(format!("ingest-endpoint 형식 오류: {e}")))?;
        Ok(())
    }

    /// 플러시 주기를 Duration으로 반환
    pub fn send_interval(&self) -> Duration {
        Duration::from_secs(self.send_interval)
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_send_interval_secs() -> u64 {
    5
}
fn default_project() -> String {
    "myproject".to_string()
}
fn default_report_times_multiplier() -> u64 {
    1_000
}
fn default_api_endpoint() -> String {
    "https://api.newrelic.com/graphql".to_string()
}
fn default_ingest_endpoint() -> String {
    "https://metric-api.newrelic.com/metric/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ReporterConfig::default();
        assert_eq!(config.send_interval, 5);
        assert_eq!(config.report_times_multiplier, 1_000);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.project, "myproject");
        assert_eq!(config.browser_open, BrowserOpen::None);
        assert!(!config.static_report);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn kebab_case_keys() {
        let raw = r#"{
            "send-interval": 30,
            "browser-open": "both",
            "project": "checkout",
            "custom-tags": {"env": "staging"},
            "report-times-multiplier": 1,
            "static-report": true,
            "account-id": "1234567",
            "api-token": "NRAK-XXX"
        }"#;
        let config: ReporterConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.send_interval, 30);
        assert_eq!(config.browser_open, BrowserOpen::Both);
        assert_eq!(config.project, "checkout");
        assert_eq!(config.custom_tags["env"], "staging");
        assert_eq!(config.report_times_multiplier, 1);
        assert!(config.static_report);
        assert_eq!(config.account_id, "1234567");
        assert_eq!(config.api_token.as_deref(), Some("NRAK-XXX"));
    }

    #[test]
    fn browser_open_windows() {
        assert!(BrowserOpen::Start.at_start());
        assert!(!BrowserOpen::Start.at_end());
        assert!(BrowserOpen::Both.at_start());
        assert!(BrowserOpen::Both.at_end());
        assert!(!BrowserOpen::None.at_start());
        assert!(!BrowserOpen::None.at_end());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"project": "api-suite", "timeout": 10}}"#).unwrap();
        let config = ReporterConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.project, "api-suite");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        // 나머지는 기본값
        assert_eq!(config.send_interval(), Duration::from_secs(5));
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let config = ReporterConfig {
            api_endpoint: "not a url".to_string(),
            ..ReporterConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }
}
