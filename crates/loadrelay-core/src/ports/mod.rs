//! 포트 인터페이스.
//!
//! 네트워크 어댑터와 도메인 로직 사이의 seam. 구현은
//! `loadrelay-network`, 테스트에서는 mock trait 구현으로 대체한다.

pub mod browser;
pub mod dashboard_api;
pub mod metric_ingest;

pub use browser::{BrowserLauncher, LogOnlyBrowser};
pub use dashboard_api::{DashboardApi, DashboardEntity, EntitySearchResult};
pub use metric_ingest::MetricIngest;
