//! 대시보드 관리 상태 기계.
//!
//! 프로젝트 이름으로 기존 대시보드를 찾거나(resolve), 템플릿으로 새로
//! 만들고(create) 최종 일관성 검색 인덱스를 폴링해 고정 URL을 얻는다.
//! 모든 실패는 경고와 함께 일반 대시보드 URL로 강등된다 — 메트릭 업로드
//! 경로는 대시보드 실패에 영향받지 않는다.

use loadrelay_core::error::CoreError;
use loadrelay_core::ports::dashboard_api::{DashboardApi, EntitySearchResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::retry::RetryPolicy;

/// 폴링·생성이 모두 실패했을 때 쓰는 일반 대시보드 URL
pub const FALLBACK_DASHBOARD_URL: &str = "https://one.newrelic.com/dashboards";

/// 템플릿의 프로젝트 자리표시자
pub const PROJECT_PLACEHOLDER: &str = "PROJECT_PLACE_HOLDER";

/// 템플릿의 계정 ID 자리표시자
pub const ACCOUNT_PLACEHOLDER: &str = "ACCOUNT_PLACE_HOLDER";

/// 기본 폴링/스냅샷 재시도 예산
const DEFAULT_RETRY_LIMIT: u32 = 5;

/// 생성 직후 검색 인덱스 폴링 간격
const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(10);

/// PDF 생성 전 데이터 정착 대기
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(10);

/// 스냅샷 링크 busy-retry의 벽시계 한도
const SNAPSHOT_DEADLINE: Duration = Duration::from_secs(60);

/// 프로젝트의 대시보드 명명 규칙
pub fn dashboard_name(project: &str) -> String {
    format!("Load Tests [{project}]")
}

/// 대시보드 관리자
///
/// GUID와 고정 URL은 실행당 한 번 기록 후 캐시되지만, 조회가 실패하면
/// 다시 계산될 수 있다.
pub struct DashboardManager {
    api: Arc<dyn DashboardApi>,
    account_id: String,
    template: String,
    dashboard_guid: Option<String>,
    retry_limit: u32,
    poll_delay: Duration,
    settle_delay: Duration,
}

impl DashboardManager {
    /// 새 관리자 생성
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            account_id: String::new(),
            template: String::new(),
            dashboard_guid: None,
            retry_limit: DEFAULT_RETRY_LIMIT,
            poll_delay: DEFAULT_POLL_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// 폴링/스냅샷 재시도 예산 설정
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// 폴링 간격 설정 (테스트에서 밀리초로 줄인다)
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// PDF 정착 대기 설정
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// 계정 ID 설정
    pub fn set_account_id(&mut self, account_id: &str) {
        self.account_id = account_id.to_string();
    }

    /// 템플릿 본문 설정
    pub fn set_template(&mut self, template: &str) {
        self.template = template.to_string();
    }

    /// 템플릿 파일 로드. 파일 없음과 그 밖의 읽기 실패를 구분해 기록한다.
    pub fn load_template(&mut self, path: &Path) -> Result<(), CoreError> {
        match std::fs::read_to_string(path) {
            Ok(template) => {
                info!("템플릿 사용: {}", path.display());
                self.template = template;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoreError::Config(format!(
                "템플릿 파일 없음: {}",
                path.display()
            ))),
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    /// 마지막으로 확인된 대시보드 GUID
    pub fn dashboard_guid(&self) -> Option<&str> {
        self.dashboard_guid.as_deref()
    }

    /// 최소 신원 조회로 토큰/엔드포인트 확인.
    /// 실패하면 대시보드 기능 전체가 비활성화된다 (치명적 아님).
    pub async fn api_check(&self) -> bool {
        match self.api.current_user().await {
            Ok(owner) => {
                info!("인증 성공, 토큰 소유자: {owner}");
                true
            }
            Err(e) => {
                warn!("관리 API 확인 실패: {e}");
                false
            }
        }
    }

    /// 계정 ID 자동 탐색 — 토큰으로 접근 가능한 첫 계정을 쓴다.
    /// 실패 시 빈 문자열 (대시보드 기능 비활성화로 처리).
    pub async fn discover_account_id(&self) -> String {
        match self.api.list_accounts().await {
            Ok(accounts) if !accounts.is_empty() => {
                let first = accounts[0];
                info!(
                    "계정 {}개 발견, 기본으로 {first} 사용 (account-id 설정으로 재정의 가능)",
                    accounts.len()
                );
                first.to_string()
            }
            Ok(_) => {
                warn!("접근 가능한 계정이 없음");
                String::new()
            }
            Err(e) => {
                warn!("계정 목록 조회 실패: {e}");
                String::new()
            }
        }
    }

    /// 기존 대시보드 조회, 없으면 생성. 항상 표시 가능한 URL을 돌려준다.
    pub async fn dashboard_link(&mut self, project: &str) -> String {
        let name = dashboard_name(project);
        match self.api.search_dashboards_by_name(&name).await {
            Ok(result) if result.count > 0 => match Self::pick_first(&result) {
                Some((guid, permalink)) => {
                    info!("대시보드 발견: {name}");
                    self.dashboard_guid = Some(guid);
                    permalink
                }
                None => {
                    warn!("검색 매치 수 {}인데 엔티티 목록이 비어 있음", result.count);
                    FALLBACK_DASHBOARD_URL.to_string()
                }
            },
            Ok(_) => {
                info!("프로젝트 \"{project}\" 대시보드 없음, 생성 시작");
                self.dashboard_create(project).await
            }
            Err(e) => {
                warn!("대시보드 검색 응답 문제: {e}");
                FALLBACK_DASHBOARD_URL.to_string()
            }
        }
    }

    /// 템플릿으로 대시보드 생성 후 고정 URL 폴링.
    ///
    /// 검색 인덱스가 최종 일관성이라 parentId 검색을 고정 간격으로
    /// 재시도한다. 예산 소진을 포함한 모든 실패는 일반 URL로 강등.
    async fn dashboard_create(&mut self, project: &str) -> String {
        if self.template.is_empty() {
            warn!("대시보드 템플릿이 없어 생성을 건너뜀 (dashboard-template-path 설정 필요)");
            return FALLBACK_DASHBOARD_URL.to_string();
        }

        let mutation = self
            .template
            .replace(PROJECT_PLACEHOLDER, project)
            .replace(ACCOUNT_PLACEHOLDER, &self.account_id);

        let guid = match self.api.create_dashboard(&mutation).await {
            Ok(guid) => guid,
            Err(e) => {
                warn!("프로젝트 {project} 대시보드 생성 실패: {e}");
                Self::warn_probable_causes();
                return FALLBACK_DASHBOARD_URL.to_string();
            }
        };
        info!("프로젝트 \"{project}\" 대시보드 생성됨, 링크 폴링");
        self.dashboard_guid = Some(guid.clone());

        let api = Arc::clone(&self.api);
        // 마감 = 지연 합계 + 회당 네트워크 지연 몫
        let poll = RetryPolicy::attempts(self.retry_limit + 1)
            .with_delay(self.poll_delay)
            .with_deadline(self.poll_delay * (self.retry_limit + 1) + Duration::from_secs(60));
        let polled = poll
            .run(
                || {
                    let api = Arc::clone(&api);
                    let guid = guid.clone();
                    async move {
                        let result = api.search_dashboards_by_parent(&guid).await?;
                        Self::pick_first(&result).ok_or_else(|| {
                            CoreError::Internal("고정 URL이 아직 준비되지 않음".to_string())
                        })
                    }
                },
                |_| true,
            )
            .await;

        match polled {
            Ok((child_guid, permalink)) => {
                self.dashboard_guid = Some(child_guid);
                permalink
            }
            Err(e) => {
                warn!("고정 URL 폴링 실패 ({e}), 일반 링크로 대체");
                Self::warn_probable_causes();
                FALLBACK_DASHBOARD_URL.to_string()
            }
        }
    }

    /// 주어진 시간 창의 PDF 스냅샷을 내려받아
    /// `static_report_<YYYY-MM-DD-HH-MM-SS>.pdf`로 저장한다.
    /// 모든 실패는 경고로 끝난다 — 실행을 실패시키지 않는다.
    pub async fn create_pdf(
        &self,
        begin_time_ms: u64,
        end_time_ms: u64,
        out_dir: &Path,
    ) -> Option<PathBuf> {
        let Some(guid) = self.dashboard_guid.clone() else {
            warn!("대시보드 GUID가 없어 PDF 생성을 건너뜀");
            return None;
        };

        info!("PDF 리포트 생성 준비, 잔여 데이터 정착 대기");
        sleep(self.settle_delay).await;

        let api = Arc::clone(&self.api);
        let link = RetryPolicy::attempts(self.retry_limit + 1)
            .with_deadline(SNAPSHOT_DEADLINE)
            .run(
                || {
                    let api = Arc::clone(&api);
                    let guid = guid.clone();
                    async move {
                        api.snapshot_url(&guid, begin_time_ms, end_time_ms)
                            .await?
                            .ok_or_else(|| {
                                CoreError::Internal("스냅샷 링크가 아직 없음".to_string())
                            })
                    }
                },
                |_| true,
            )
            .await;

        let link = match link {
            Ok(link) => link,
            Err(e) => {
                warn!("PDF 링크 생성 실패: {e}");
                return None;
            }
        };
        info!("PDF 리포트 링크: {link}");

        let bytes = match self.api.fetch_snapshot(&link).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("PDF 다운로드 실패 (네트워크/방화벽 확인): {e}");
                return None;
            }
        };

        let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
        let path = out_dir.join(format!("static_report_{stamp}.pdf"));
        match std::fs::write(&path, bytes) {
            Ok(()) => {
                info!("정적 리포트 저장: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("정적 리포트 저장 실패: {e}");
                None
            }
        }
    }

    /// 검색 결과에서 결정적으로 첫 항목 선택.
    /// 기존 조회 경로와 생성 직후 경로 모두 같은 규칙을 쓴다.
    fn pick_first(result: &EntitySearchResult) -> Option<(String, String)> {
        result
            .entities
            .first()
            .map(|e| (e.guid.clone(), e.permalink.clone()))
    }

    fn warn_probable_causes() {
        warn!("가능한 원인: 템플릿 렌더링, API 접근 권한, account-id, 프로젝트 이름의 특수문자");
        warn!("문서를 확인하세요. 그동안 일반 대시보드 링크를 사용합니다");
    }
}
