//! # loadrelay-core
//!
//! loadrelay 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 어댑터 crate들이 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 샘플 윈도우/메트릭 레코드 (serde Serialize/Deserialize)
//! - [`ports`] — 수집/대시보드/브라우저 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입과 실패 분류 (thiserror)
//! - [`config`] — 리포터 설정 구조체
//! - [`credentials`] — 계층형 토큰 해석 (설정 > 환경변수 > 파일)

pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod ports;
