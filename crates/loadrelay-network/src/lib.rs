//! # loadrelay-network
//!
//! HTTP 네트워크 어댑터. 메트릭 수집 엔드포인트와 관리 GraphQL 엔드포인트
//! 두 개의 아웃바운드 표면을 담당하며, `loadrelay-core`의 포트를 구현한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use loadrelay_network::metric_client::MetricApiClient;
//! use loadrelay_network::graphql::GraphqlClient;
//! ```

pub mod graphql;
pub mod metric_client;
