//! 자격증명 해석.
//!
//! 토큰을 설정값 → 환경변수 → 파일 순서로 해석한다. 첫 번째 비어 있지 않은
//! 값이 승리하고, 각 단계의 miss는 info 레벨로 기록된다. 모든 소스가
//! 비어 있으면 `None` — 에러를 내지 않으며 치명 여부 판단은 호출부 책임이다
//! (수집 토큰 누락은 기동 중단, 관리 토큰 누락은 대시보드 기능 비활성화).

use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::config::ReporterConfig;

/// 수집 토큰 환경변수
pub const INSERT_KEY_ENV: &str = "NEW_RELIC_INSERT_KEY";

/// 관리 API 토큰 환경변수
pub const API_KEY_ENV: &str = "NEW_RELIC_API_KEY";

/// 계층형 토큰 해석기
///
/// 소스 이름을 파라미터로 받아 수집/관리 토큰 양쪽에 같은 코드를 쓴다.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    /// 로그 식별용 이름 (예: "ingest", "management")
    kind: String,
    /// 설정에 직접 지정된 값
    config_value: Option<String>,
    /// 환경변수 이름
    env_var: String,
    /// 토큰 파일 경로
    file_path: Option<PathBuf>,
}

impl CredentialResolver {
    /// 해석기 생성
    pub fn new(
        kind: &str,
        config_value: Option<String>,
        env_var: &str,
        file_path: Option<PathBuf>,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            config_value,
            env_var: env_var.to_string(),
            file_path,
        }
    }

    /// 수집 토큰 해석기 (`token` / NEW_RELIC_INSERT_KEY / `token-file`)
    pub fn ingest(config: &ReporterConfig) -> Self {
        Self::new(
            "ingest",
            config.token.clone(),
            INSERT_KEY_ENV,
            config.token_file.clone(),
        )
    }

    /// 관리 토큰 해석기 (`api-token` / NEW_RELIC_API_KEY / `api-token-file`)
    pub fn management(config: &ReporterConfig) -> Self {
        Self::new(
            "management",
            config.api_token.clone(),
            API_KEY_ENV,
            config.api_token_file.clone(),
        )
    }

    /// 고정 우선순위로 토큰 해석: 설정 > 환경변수 > 파일
    pub fn resolve(&self) -> Option<String> {
        if let Some(value) = &self.config_value {
            if !value.trim().is_empty() {
                info!("{} 토큰을 설정에서 찾음", self.kind);
                return Some(value.trim().to_string());
            }
        }
        info!("{} 토큰이 설정에 없음", self.kind);

        match std::env::var(&self.env_var) {
            Ok(value) if !value.trim().is_empty() => {
                info!("{} 토큰을 {} 환경변수에서 찾음", self.kind, self.env_var);
                return Some(value.trim().to_string());
            }
            _ => info!("{} 토큰이 {} 환경변수에 없음", self.kind, self.env_var),
        }

        if let Some(path) = &self.file_path {
            match fs::read_to_string(path) {
                Ok(raw) if !raw.trim().is_empty() => {
                    info!("{} 토큰을 파일 {}에서 찾음", self.kind, path.display());
                    return Some(raw.trim().to_string());
                }
                Ok(_) => info!("{} 토큰 파일 {}이 비어 있음", self.kind, path.display()),
                Err(e) => info!(
                    "{} 토큰 파일 {}을 읽을 수 없음 (경로/권한 확인): {e}",
                    self.kind,
                    path.display()
                ),
            }
        } else {
            info!("{} 토큰 파일 경로가 설정되지 않음", self.kind);
        }

        None
    }
}
