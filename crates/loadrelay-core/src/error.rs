//! loadrelay 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 전송 계층 에러를 `CoreError`로 매핑한다.
//! 재시도 분류(`is_transient`)와 프로세스 종료 코드(`exit_code`)를
//! 에러 타입 자체에 두어 실패 정책을 호출부에서 검증 가능하게 한다.

use thiserror::Error;

/// 코어 레이어 에러.
///
/// 리포터 전체가 공유하는 실패 분류:
/// - `Network` — 일시적 네트워크 문제, 재시도 대상
/// - `Config` / `Auth` — 기동 시점 설정·자격증명 문제
/// - `BadResponse` / `ClientConstruction` — 복구 불가, 종료 코드 구분 대상
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러 (토큰 파일, 템플릿 파일, 리포트 저장)
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 설정값 오류 (필수 토큰 누락 포함)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 인증 실패 (API 키 거부, 권한 부족)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 일시적 네트워크 에러 (연결 실패, 타임아웃, TLS/DNS 문제)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 수집 엔드포인트의 비정상 응답 (HTTP >= 300)
    #[error("비정상 응답 (HTTP {status}): {body}")]
    BadResponse {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문 (잘린 형태일 수 있음)
        body: String,
    },

    /// 전송 클라이언트 구성 실패 (기동 중단 대상)
    #[error("클라이언트 구성 실패: {0}")]
    ClientConstruction(String),

    /// GraphQL 응답의 errors 배열
    #[error("GraphQL 에러: {0}")]
    Graphql(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 일시적 네트워크 문제 여부 — 세션 내부 재시도 대상은 이 범주뿐이다.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Network(_))
    }

    /// 호스트 바이너리가 사용할 프로세스 종료 코드.
    ///
    /// 클라이언트 구성 실패와 비정상 응답을 구분된 코드로 노출한다
    /// (sysexits의 EX_SOFTWARE/EX_PROTOCOL에 준함). 그 외는 일반 실패 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::ClientConstruction(_) => 70,
            CoreError::BadResponse { .. } => 76,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(CoreError::Network("connect refused".to_string()).is_transient());
        assert!(!CoreError::Auth("denied".to_string()).is_transient());
        assert!(!CoreError::BadResponse {
            status: 403,
            body: String::new()
        }
        .is_transient());
        assert!(!CoreError::Internal("boom".to_string()).is_transient());
    }

    #[test]
    fn distinct_exit_codes() {
        let construction = CoreError::ClientConstruction("tls backend".to_string());
        let response = CoreError::BadResponse {
            status: 500,
            body: "oops".to_string(),
        };
        assert_ne!(construction.exit_code(), response.exit_code());
        assert_eq!(CoreError::Config("no token".to_string()).exit_code(), 1);
    }
}
