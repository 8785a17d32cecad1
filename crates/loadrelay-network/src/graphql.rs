//! 관리 GraphQL 전송.
//!
//! `DashboardApi` 포트 구현. 단일 GraphQL 엔드포인트에 API-Key 헤더로
//! 인증하며, 검색어는 변수 + 이스케이프를 거쳐 전달한다 — 프로젝트 이름이
//! 쿼리 본문에 원문 그대로 흘러 들어가지 않는다. 대시보드 생성 템플릿만은
//! 사용자 소유의 mutation 문서라서 원문 그대로 제출된다.

use async_trait::async_trait;
use loadrelay_core::error::CoreError;
use loadrelay_core::ports::dashboard_api::{DashboardApi, DashboardEntity, EntitySearchResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// 신원 조회 — 토큰 소유자 이름
const QUERY_CURRENT_USER: &str = "{ actor { user { name } } }";

/// 엔티티 검색 — 검색어는 변수로 전달
const QUERY_ENTITY_SEARCH: &str = "query($query: String!) { actor { entitySearch(query: $query) \
     { count results { entities { guid permalink } } } } }";

/// 계정 목록
const QUERY_ACCOUNTS: &str = "{ actor { accounts { id } } }";

/// 스냅샷 URL 발급
const MUTATION_SNAPSHOT_URL: &str = "mutation($guid: EntityGuid!, $begin: EpochMilliseconds!, \
     $end: EpochMilliseconds!) { dashboardCreateSnapshotUrl(guid: $guid, \
     params: { timeWindow: { beginTime: $begin, endTime: $end } }) }";

/// 엔티티 검색 문자열 내부 이스케이프.
///
/// 검색어 자체는 GraphQL 변수라 JSON 이스케이프는 자동이지만,
/// `name LIKE '...'` 내부의 작은따옴표와 역슬래시는 직접 처리해야 한다.
fn escape_search_term(term: &str) -> String {
    term.replace('\\', "\\\\").replace('\'', "\\'")
}

/// 이름 패턴 검색 조건 구성
fn name_search_condition(name: &str) -> String {
    format!("name LIKE '%{}%'", escape_search_term(name))
}

// ============================================================
// 응답 구조체
// ============================================================

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    actor: SearchActor,
}

#[derive(Debug, Deserialize)]
struct SearchActor {
    #[serde(rename = "entitySearch")]
    entity_search: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    count: u64,
    results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    entities: Vec<DashboardEntity>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorBody {
    message: String,
}

// ============================================================
// 클라이언트
// ============================================================

/// GraphQL 관리 API 클라이언트 — `DashboardApi` 포트 구현
pub struct GraphqlClient {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl GraphqlClient {
    /// 새 GraphQL 클라이언트 생성. 구성 실패는 치명적 에러로 구분된다.
    pub fn new(endpoint: &str, api_token: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CoreError::ClientConstruction(format!("GraphQL 클라이언트 빌드 실패: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_token: api_token.to_string(),
        })
    }

    /// 쿼리 실행, `data` 값 반환. GraphQL `errors` 배열은 에러로 매핑.
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, CoreError> {
        let body = json!({ "query": query, "variables": variables });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("API-Key", &self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("GraphQL 요청 실패: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("GraphQL 응답 읽기 실패: {e}")))?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CoreError::Auth(format!("관리 API 인증 거부 ({status})")));
        }
        if !status.is_success() {
            return Err(CoreError::Graphql(format!("HTTP {status}: {text}")));
        }

        let envelope: Value = serde_json::from_str(&text)?;
        if let Some(errors) = envelope.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        serde_json::from_value::<GraphqlErrorBody>(e.clone())
                            .map_or_else(|_| e.to_string(), |b| b.message)
                    })
                    .collect();
                return Err(CoreError::Graphql(messages.join("; ")));
            }
        }

        envelope
            .get("data")
            .cloned()
            .ok_or_else(|| CoreError::Graphql("응답에 data 필드 없음".to_string()))
    }

    /// 응답에서 문자열 하나를 JSON pointer로 추출
    fn extract_str(data: &Value, pointer: &str) -> Result<String, CoreError> {
        data.pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CoreError::Graphql(format!("응답에 {pointer} 없음")))
    }

    async fn entity_search(&self, condition: &str) -> Result<EntitySearchResult, CoreError> {
        let data = self
            .execute(QUERY_ENTITY_SEARCH, json!({ "query": condition }))
            .await?;
        let envelope: SearchEnvelope = serde_json::from_value(data)?;
        let body = envelope.actor.entity_search;
        debug!("엔티티 검색 매치 수: {}", body.count);
        Ok(EntitySearchResult {
            count: body.count,
            entities: body.results.map(|r| r.entities).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl DashboardApi for GraphqlClient {
    async fn current_user(&self) -> Result<String, CoreError> {
        let data = self.execute(QUERY_CURRENT_USER, Value::Null).await?;
        Self::extract_str(&data, "/actor/user/name")
    }

    async fn search_dashboards_by_name(&self, name: &str) -> Result<EntitySearchResult, CoreError> {
        self.entity_search(&name_search_condition(name)).await
    }

    async fn search_dashboards_by_parent(
        &self,
        guid: &str,
    ) -> Result<EntitySearchResult, CoreError> {
        let condition = format!("parentId = '{}'", escape_search_term(guid));
        self.entity_search(&condition).await
    }

    async fn create_dashboard(&self, mutation: &str) -> Result<String, CoreError> {
        let data = self.execute(mutation, Value::Null).await?;
        Self::extract_str(&data, "/dashboardCreate/entityResult/guid")
    }

    async fn snapshot_url(
        &self,
        guid: &str,
        begin_time_ms: u64,
        end_time_ms: u64,
    ) -> Result<Option<String>, CoreError> {
        let data = self
            .execute(
                MUTATION_SNAPSHOT_URL,
                json!({ "guid": guid, "begin": begin_time_ms, "end": end_time_ms }),
            )
            .await?;
        match data.pointer("/dashboardCreateSnapshotUrl") {
            Some(Value::String(url)) => Ok(Some(url.clone())),
            _ => Ok(None),
        }
    }

    async fn list_accounts(&self) -> Result<Vec<i64>, CoreError> {
        let data = self.execute(QUERY_ACCOUNTS, Value::Null).await?;
        let accounts = data
            .pointer("/actor/accounts")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::Graphql("응답에 accounts 없음".to_string()))?;
        Ok(accounts
            .iter()
            .filter_map(|a| a.get("id").and_then(Value::as_i64))
            .collect())
    }

    async fn fetch_snapshot(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("스냅샷 다운로드 실패: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::BadResponse {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CoreError::Network(format!("스냅샷 본문 읽기 실패: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::ServerGuard) -> GraphqlClient {
        GraphqlClient::new(&server.url(), "NRAK-TEST", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn search_term_escaping() {
        assert_eq!(escape_search_term("plain"), "plain");
        assert_eq!(escape_search_term("o'brien"), "o\\'brien");
        assert_eq!(escape_search_term("a\\b"), "a\\\\b");
        assert_eq!(
            name_search_condition("Load Tests [o'brien]"),
            "name LIKE '%Load Tests [o\\'brien]%'"
        );
    }

    #[tokio::test]
    async fn current_user_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("API-Key", "NRAK-TEST")
            .with_status(200)
            .with_body(r#"{"data":{"actor":{"user":{"name":"alex"}}}}"#)
            .create_async()
            .await;

        let name = client(&server).current_user().await.unwrap();
        assert_eq!(name, "alex");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(401)
            .with_body("denied")
            .create_async()
            .await;

        let err = client(&server).current_user().await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(_)));
    }

    #[tokio::test]
    async fn graphql_errors_array_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"invalid key"}]}"#)
            .create_async()
            .await;

        let err = client(&server).current_user().await.unwrap_err();
        match err {
            CoreError::Graphql(msg) => assert!(msg.contains("invalid key")),
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn entity_search_parses_entities() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                r#"{"data":{"actor":{"entitySearch":{"count":2,"results":{"entities":[
                    {"guid":"g-1","permalink":"https://one.newrelic.com/d/1"},
                    {"guid":"g-2","permalink":"https://one.newrelic.com/d/2"}
                ]}}}}}"#,
            )
            .create_async()
            .await;

        let result = client(&server)
            .search_dashboards_by_name("Load Tests [checkout]")
            .await
            .unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(result.entities[0].guid, "g-1");
        assert_eq!(result.entities[1].permalink, "https://one.newrelic.com/d/2");
    }

    #[tokio::test]
    async fn entity_search_empty_results() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"actor":{"entitySearch":{"count":0,"results":null}}}}"#)
            .create_async()
            .await;

        let result = client(&server)
            .search_dashboards_by_name("Load Tests [nope]")
            .await
            .unwrap();
        assert_eq!(result.count, 0);
        assert!(result.entities.is_empty());
    }

    #[tokio::test]
    async fn create_dashboard_returns_guid() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"dashboardCreate":{"entityResult":{"guid":"new-guid"}}}}"#)
            .create_async()
            .await;

        let guid = client(&server)
            .create_dashboard("mutation { dashboardCreate }")
            .await
            .unwrap();
        assert_eq!(guid, "new-guid");
    }

    #[tokio::test]
    async fn snapshot_url_null_means_not_ready() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"dashboardCreateSnapshotUrl":null}}"#)
            .create_async()
            .await;

        let url = client(&server)
            .snapshot_url("g-1", 1_000, 2_000)
            .await
            .unwrap();
        assert!(url.is_none());
    }

    #[tokio::test]
    async fn snapshot_url_present() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"dashboardCreateSnapshotUrl":"https://pdf.example/snap.pdf"}}"#)
            .create_async()
            .await;

        let url = client(&server)
            .snapshot_url("g-1", 1_000, 2_000)
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://pdf.example/snap.pdf"));
    }

    #[tokio::test]
    async fn list_accounts_returns_ids() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"actor":{"accounts":[{"id":111},{"id":222}]}}}"#)
            .create_async()
            .await;

        let accounts = client(&server).list_accounts().await.unwrap();
        assert_eq!(accounts, vec![111, 222]);
    }

    #[tokio::test]
    async fn fetch_snapshot_binary() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/snap.pdf")
            .with_status(200)
            .with_body(b"%PDF-1.7 fake".to_vec())
            .create_async()
            .await;

        let bytes = client(&server)
            .fetch_snapshot(&format!("{}/snap.pdf", server.url()))
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
