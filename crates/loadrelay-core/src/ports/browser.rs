//! 브라우저 실행 포트.
//!
//! 결과 URL 열기는 호스트 엔진의 편의 기능이므로 포트 뒤로 분리한다.
//! 기본 구현은 URL을 로그로만 남긴다.

use tracing::info;

/// 결과 URL 열기
pub trait BrowserLauncher: Send + Sync {
    /// 주어진 URL을 연다 (실패는 무시 가능한 편의 기능)
    fn open(&self, url: &str);
}

/// 로그만 남기는 기본 구현
#[derive(Debug, Default)]
pub struct LogOnlyBrowser;

impl BrowserLauncher for LogOnlyBrowser {
    fn open(&self, url: &str) {
        info!("결과 URL: {url}");
    }
}
