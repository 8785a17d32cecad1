//! 대시보드 API 포트.
//!
//! 구현: `loadrelay-network` crate (reqwest GraphQL 전송).
//! 고정된 요청/응답 계약의 불투명 전송으로 취급한다 — 쿼리 본문 구성과
//! 응답 파싱은 구현 몫이고, 상태 기계는 이 trait만 본다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 엔티티 검색 결과의 대시보드 항목
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DashboardEntity {
    /// 엔티티 GUID
    pub guid: String,
    /// 고정 URL
    pub permalink: String,
}

/// 엔티티 검색 결과
#[derive(Debug, Clone, Default)]
pub struct EntitySearchResult {
    /// 백엔드가 보고한 매치 수
    pub count: u64,
    /// 검색된 엔티티 목록
    pub entities: Vec<DashboardEntity>,
}

/// 관리 API 클라이언트 (GraphQL)
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// 최소 신원 조회 — 토큰 소유자 이름 반환. 인증 확인에 사용
    async fn current_user(&self) -> Result<String, CoreError>;

    /// 이름 패턴으로 대시보드 검색
    async fn search_dashboards_by_name(&self, name: &str) -> Result<EntitySearchResult, CoreError>;

    /// parentId로 대시보드 검색 (생성 직후 최종 일관성 폴링에 사용)
    async fn search_dashboards_by_parent(
        &self,
        guid: &str,
    ) -> Result<EntitySearchResult, CoreError>;

    /// 생성 mutation 문서 제출, 새 GUID 반환
    async fn create_dashboard(&self, mutation: &str) -> Result<String, CoreError>;

    /// 주어진 시간 창의 스냅샷 URL 발급. 아직 준비되지 않았으면 `None`
    async fn snapshot_url(
        &self,
        guid: &str,
        begin_time_ms: u64,
        end_time_ms: u64,
    ) -> Result<Option<String>, CoreError>;

    /// 토큰으로 접근 가능한 계정 ID 목록
    async fn list_accounts(&self) -> Result<Vec<i64>, CoreError>;

    /// 스냅샷 바이너리를 일반 HTTP GET으로 가져온다
    async fn fetch_snapshot(&self, url: &str) -> Result<Vec<u8>, CoreError>;
}
