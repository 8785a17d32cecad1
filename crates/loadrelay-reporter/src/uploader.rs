//! 업로더 수명주기 오케스트레이터.
//!
//! prepare → startup → (on_sample / tick)* → post_process 순서로
//! 움직인다. 대시보드는 부가 기능이라 어떤 실패도 업로드 경로를 막지
//! 않지만, 수집 토큰 부재와 연결 probe 실패는 준비 단계에서 치명적이다.

use loadrelay_core::config::ReporterConfig;
use loadrelay_core::credentials::CredentialResolver;
use loadrelay_core::error::CoreError;
use loadrelay_core::models::metric::{TagMap, TimeBounds};
use loadrelay_core::models::sample::SampleWindow;
use loadrelay_core::ports::browser::{BrowserLauncher, LogOnlyBrowser};
use loadrelay_core::ports::dashboard_api::DashboardApi;
use loadrelay_core::ports::metric_ingest::MetricIngest;
use loadrelay_network::graphql::GraphqlClient;
use loadrelay_network::metric_client::MetricApiClient;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::dashboard::{DashboardManager, FALLBACK_DASHBOARD_URL};
use crate::serializer::DatapointSerializer;
use crate::session::TransportSession;

/// 버퍼링 업로더
///
/// 샘플 창을 모아 `send-interval`마다 한 묶음으로 내보낸다. 전송 실패는
/// 해당 묶음을 버리고 계속한다 — 실시간 스트림에서 늦은 데이터보다
/// 진행이 우선이다.
pub struct Uploader {
    config: ReporterConfig,
    browser: Arc<dyn BrowserLauncher>,
    session: Option<TransportSession>,
    dashboard: Option<DashboardManager>,
    dashboard_enabled: bool,
    buffer: Vec<SampleWindow>,
    serializer: DatapointSerializer,
    base_tags: TagMap,
    bounds: TimeBounds,
    last_dispatch: Option<Instant>,
    time_start_ms: Option<u64>,
    results_url: String,
    session_id: String,
}

impl Uploader {
    /// 설정으로 업로더 생성. 네트워크 연결은 `prepare`에서 일어난다.
    pub fn new(config: ReporterConfig) -> Self {
        Self {
            config,
            browser: Arc::new(LogOnlyBrowser),
            session: None,
            dashboard: None,
            dashboard_enabled: false,
            buffer: Vec::new(),
            serializer: DatapointSerializer::default(),
            base_tags: TagMap::new(),
            bounds: TimeBounds::default(),
            last_dispatch: None,
            time_start_ms: None,
            results_url: FALLBACK_DASHBOARD_URL.to_string(),
            session_id: String::new(),
        }
    }

    /// 브라우저 런처 교체 (기본은 URL 로그만 남김)
    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    /// 실제 HTTP 클라이언트를 구성해 준비한다.
    ///
    /// 수집 토큰이 없으면 설정 에러. 관리 토큰이 없으면 대시보드 기능만
    /// 비활성화하고 진행한다.
    pub async fn prepare(&mut self) -> Result<(), CoreError> {
        self.config.validate()?;

        let Some(insert_key) = CredentialResolver::ingest(&self.config).resolve() else {
            return Err(CoreError::Config(
                "수집 토큰 없음: token 설정, NEW_RELIC_INSERT_KEY, token-file 중 하나 필요"
                    .to_string(),
            ));
        };
        let ingest = MetricApiClient::new(
            &self.config.ingest_endpoint,
            &insert_key,
            self.config.timeout(),
        )?;

        let api: Option<Arc<dyn DashboardApi>> =
            match CredentialResolver::management(&self.config).resolve() {
                Some(api_key) => Some(Arc::new(GraphqlClient::new(
                    &self.config.api_endpoint,
                    &api_key,
                    self.config.timeout(),
                )?)),
                None => None,
            };

        self.prepare_with(Arc::new(ingest), api).await
    }

    /// 주입된 포트로 준비한다. `prepare`가 실제 클라이언트로 호출하고,
    /// 테스트는 mock으로 직접 호출한다.
    pub async fn prepare_with(
        &mut self,
        ingest: Arc<dyn MetricIngest>,
        api: Option<Arc<dyn DashboardApi>>,
    ) -> Result<(), CoreError> {
        self.session_id = uuid::Uuid::new_v4().to_string();
        self.base_tags = TagMap::new();
        self.base_tags
            .insert("project".to_string(), self.config.project.clone().into());
        self.base_tags
            .insert("id".to_string(), self.session_id.clone().into());
        for (key, value) in &self.config.custom_tags {
            self.base_tags.insert(key.clone(), value.clone().into());
        }
        self.serializer = DatapointSerializer::new(self.config.report_times_multiplier);

        let session = TransportSession::new(ingest);
        session.probe().await.map_err(|e| {
            CoreError::Config(format!("수집 엔드포인트 probe 실패, 토큰/네트워크 확인: {e}"))
        })?;
        info!("수집 엔드포인트 연결 확인됨 (세션 {})", self.session_id);
        self.session = Some(session);

        match api {
            Some(api) => self.prepare_dashboard(api).await,
            None => {
                warn!(
                    "관리 토큰 없음 (api-token, {}, api-token-file) — 대시보드 기능 비활성화",
                    loadrelay_core::credentials::API_KEY_ENV
                );
            }
        }
        Ok(())
    }

    /// 대시보드 관리자 구성. 어느 단계가 실패해도 경고 후 비활성화.
    async fn prepare_dashboard(&mut self, api: Arc<dyn DashboardApi>) {
        let mut manager = DashboardManager::new(api);

        if !manager.api_check().await {
            warn!("관리 API에 접근 불가 — 대시보드 기능 비활성화");
            return;
        }

        let account_id = if self.config.account_id.is_empty() {
            manager.discover_account_id().await
        } else {
            self.config.account_id.clone()
        };
        if account_id.is_empty() {
            warn!("계정 ID를 정할 수 없음 — 대시보드 기능 비활성화");
            return;
        }
        manager.set_account_id(&account_id);

        if let Some(path) = &self.config.dashboard_template_path {
            if let Err(e) = manager.load_template(path) {
                warn!("대시보드 템플릿 로드 실패 ({e}) — 대시보드 기능 비활성화");
                return;
            }
        } else {
            warn!("dashboard-template-path 미설정 — 대시보드 생성 없이 조회만 수행");
        }

        self.results_url = manager.dashboard_link(&self.config.project).await;
        self.dashboard = Some(manager);
        self.dashboard_enabled = true;
    }

    /// 실행 시작 표시. 시작 시각을 기록하고 리포트 링크를 알린다.
    pub fn startup(&mut self) {
        self.time_start_ms = Some(chrono::Utc::now().timestamp_millis() as u64);
        info!("리포트 링크: {}", self.results_url);
        if self.config.browser_open.at_start() {
            self.browser.open(&self.results_url);
        }
    }

    /// 샘플 창 하나를 버퍼에 추가한다. 네트워크는 건드리지 않는다.
    pub fn on_sample(&mut self, window: SampleWindow) {
        self.buffer.push(window);
    }

    /// 주기 체크 — `send-interval` 경과 시점에만 버퍼를 내보낸다
    pub async fn tick(&mut self) {
        let due = match self.last_dispatch {
            Some(last) => last.elapsed() >= self.config.send_interval(),
            None => true,
        };
        if !due {
            return;
        }
        self.last_dispatch = Some(Instant::now());
        if !self.buffer.is_empty() {
            self.flush().await;
        }
    }

    /// 버퍼 전체를 직렬화해 한 묶음으로 전송. 실패한 묶음은 버린다.
    async fn flush(&mut self) {
        let windows = std::mem::take(&mut self.buffer);
        let records = self
            .serializer
            .serialize(&windows, &self.base_tags, &mut self.bounds);
        debug!("샘플 창 {}개 → 레코드 {}개 전송", windows.len(), records.len());

        let Some(session) = self.session.as_mut() else {
            warn!("준비되지 않은 업로더에서 flush 호출됨");
            return;
        };
        if let Err(e) = session.send_batch(&records).await {
            warn!("데이터 전송 실패, 해당 묶음을 버리고 계속: {e}");
        }
    }

    /// 실행 종료 처리 — 잔여 버퍼 전송, 링크 재확인, 선택적 PDF, 세션 종료.
    ///
    /// 어떤 단계가 실패해도 세션은 반드시 닫힌다.
    pub async fn post_process(&mut self) {
        if !self.buffer.is_empty() {
            self.flush().await;
        }

        if self.dashboard_enabled {
            if let Some(dashboard) = self.dashboard.as_mut() {
                // 생성 직후 폴링이 실패했던 경우를 대비해 링크 재확인
                self.results_url = dashboard.dashboard_link(&self.config.project).await;
            }
        }
        info!("리포트 링크: {}", self.results_url);

        if self.config.browser_open.at_end() {
            self.browser.open(&self.results_url);
        }

        if self.config.static_report {
            match (self.dashboard.as_ref(), self.time_start_ms) {
                (Some(dashboard), Some(begin)) if self.dashboard_enabled => {
                    let end = chrono::Utc::now().timestamp_millis() as u64;
                    dashboard.create_pdf(begin, end, Path::new(".")).await;
                }
                _ => warn!("정적 리포트 생성 불가: 대시보드 비활성 또는 시작 시각 없음"),
            }
        }

        if let Some(session) = self.session.as_mut() {
            session.close();
        }
    }

    /// 현재 리포트 링크
    pub fn results_url(&self) -> &str {
        &self.results_url
    }

    /// 지금까지 직렬화된 데이터의 시간 범위
    pub fn bounds(&self) -> &TimeBounds {
        &self.bounds
    }

    /// 이번 실행의 세션 태그 값
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
