//! # loadrelay-reporter
//!
//! 부하 테스트 텔레메트리를 New Relic 계열 백엔드로 스트리밍하는
//! 리포터. 샘플 창을 버퍼링해 주기적으로 Metric API에 올리고, 프로젝트
//! 대시보드를 조회/생성해 리포트 링크를 제공한다.
//!
//! ## 구조
//!
//! - [`uploader`] — 수명주기 오케스트레이터 (prepare/startup/tick/post_process)
//! - [`session`] — 일시 장애 재시도 예산을 가진 전송 세션
//! - [`serializer`] — 샘플 창 → 게이지 메트릭 레코드 변환
//! - [`dashboard`] — 대시보드 조회/생성 상태 기계와 PDF 스냅샷
//! - [`retry`] — 고정 간격 재시도 정책

pub mod dashboard;
pub mod retry;
pub mod serializer;
pub mod session;
pub mod uploader;

pub use dashboard::DashboardManager;
pub use retry::RetryPolicy;
pub use serializer::DatapointSerializer;
pub use session::TransportSession;
pub use uploader::Uploader;
