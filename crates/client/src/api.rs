//! Typed REST client for the backend API.
//!
//! Every backend capability has exactly one method here. Requests pass
//! through the configured [`Middleware`] chain; non-2xx responses come
//! back as [`ClientError::Api`] after the chain has seen them.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use triage_core::analysis::{
    AnalysisRequest, ComparisonResult, DashboardMetrics, EfficiencyTrend, ExportFormat,
    TrendGrouping,
};
use triage_core::assignee::{AssigneeInfo, AssigneeUpdate, NewAssignee};
use triage_core::import::{
    ImportLog, ImportProgress, ImportType, TemplateFormat, ValidationResult,
};
use triage_core::page::Page;
use triage_core::system::{SystemHealth, SystemInfo};
use triage_core::types::DbId;

use crate::auth::{SessionHandler, TokenStore};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::middleware::{AuthMiddleware, LoggingMiddleware, Middleware};
use crate::upload::UploadFile;

/// Query for endpoints that take no parameters.
const NO_QUERY: &[(&str, &str)] = &[];

/// Handle to the backend API.
///
/// Construct one per application and clone it into whatever needs it;
/// clones share the connection pool, middleware chain and token store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ApiClient {
    /// Build a client with the default chain: auth, then logging.
    pub fn new(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        session: Arc<dyn SessionHandler>,
    ) -> Result<Self, ClientError> {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(AuthMiddleware::new(Arc::clone(&tokens), session)),
            Arc::new(LoggingMiddleware),
        ];
        Self::with_middleware(config, tokens, chain)
    }

    /// Build a client with an explicit middleware chain, applied in order.
    pub fn with_middleware(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                tokens,
                middleware,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Store a bearer token for subsequent requests.
    pub fn login(&self, token: &str) -> Result<(), ClientError> {
        self.inner.tokens.set_token(token)?;
        tracing::info!("Auth token stored");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.inner.tokens.clear()?;
        tracing::info!("Auth token cleared");
        Ok(())
    }

    pub fn has_token(&self) -> bool {
        self.inner.tokens.token().is_some()
    }

    // ---- dashboard ----

    /// `GET /analysis/dashboard?days=N`
    pub async fn dashboard_metrics(&self, days: u32) -> Result<Vec<DashboardMetrics>, ClientError> {
        self.get_json("/analysis/dashboard", &[("days", days.to_string())])
            .await
    }

    /// `GET /analysis/workload-distribution?days=N`
    pub async fn workload_distribution(
        &self,
        days: u32,
    ) -> Result<Vec<DashboardMetrics>, ClientError> {
        self.get_json("/analysis/workload-distribution", &[("days", days.to_string())])
            .await
    }

    /// `GET /analysis/performance-ranking?rankBy&limit&days`
    pub async fn performance_ranking(
        &self,
        rank_by: &str,
        limit: u32,
        days: u32,
    ) -> Result<Vec<DashboardMetrics>, ClientError> {
        self.get_json(
            "/analysis/performance-ranking",
            &[
                ("rankBy", rank_by.to_string()),
                ("limit", limit.to_string()),
                ("days", days.to_string()),
            ],
        )
        .await
    }

    // ---- analysis ----

    /// `POST /analysis/compare`
    pub async fn compare(&self, request: &AnalysisRequest) -> Result<ComparisonResult, ClientError> {
        let builder = self.request(Method::POST, "/analysis/compare").json(request);
        self.send_json(builder).await
    }

    /// `GET /analysis/trend?startDate&endDate&groupBy`
    pub async fn efficiency_trend(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        group_by: TrendGrouping,
    ) -> Result<Vec<EfficiencyTrend>, ClientError> {
        self.get_json(
            "/analysis/trend",
            &[
                ("startDate", start.to_string()),
                ("endDate", end.to_string()),
                ("groupBy", group_by.to_string()),
            ],
        )
        .await
    }

    /// `GET /analysis/assignee/{id}/metrics?startDate&endDate`
    pub async fn assignee_metrics(
        &self,
        assignee_id: DbId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DashboardMetrics>, ClientError> {
        self.get_json(
            &format!("/analysis/assignee/{assignee_id}/metrics"),
            &[("startDate", start.to_string()), ("endDate", end.to_string())],
        )
        .await
    }

    /// `GET /analysis/ai-assignment-analysis?startDate&endDate`
    pub async fn ai_assignment_analysis(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ComparisonResult, ClientError> {
        self.get_json(
            "/analysis/ai-assignment-analysis",
            &[("startDate", start.to_string()), ("endDate", end.to_string())],
        )
        .await
    }

    /// `GET /analysis/bottleneck-analysis?days=N`
    pub async fn bottleneck_analysis(&self, days: u32) -> Result<Vec<DashboardMetrics>, ClientError> {
        self.get_json("/analysis/bottleneck-analysis", &[("days", days.to_string())])
            .await
    }

    /// `POST /analysis/export-report?format=PDF|EXCEL`, returning the report
    /// bytes.
    pub async fn export_report(
        &self,
        request: &AnalysisRequest,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        let builder = self
            .request(Method::POST, "/analysis/export-report")
            .query(&[("format", format.as_str())])
            .json(request);
        self.send_bytes(builder).await
    }

    // ---- import ----

    /// `POST /import/upload` (multipart `file` + `importType`).
    pub async fn upload_file(
        &self,
        file: &UploadFile,
        import_type: ImportType,
    ) -> Result<ImportLog, ClientError> {
        let form = Form::new()
            .part("file", file.to_part()?)
            .text("importType", import_type.as_str());
        let builder = self.request(Method::POST, "/import/upload").multipart(form);

        tracing::info!(
            file_name = %file.file_name,
            size_bytes = file.size(),
            import_type = %import_type,
            "Uploading import file",
        );
        self.send_json(builder).await
    }

    /// `POST /import/validate` (multipart `file`).
    pub async fn validate_file(&self, file: &UploadFile) -> Result<ValidationResult, ClientError> {
        let form = Form::new().part("file", file.to_part()?);
        let builder = self.request(Method::POST, "/import/validate").multipart(form);
        self.send_json(builder).await
    }

    /// `GET /import/logs?page&size`
    pub async fn import_logs(&self, page: u32, size: u32) -> Result<Page<ImportLog>, ClientError> {
        self.get_json(
            "/import/logs",
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
    }

    /// `GET /import/status/{id}`
    pub async fn import_status(&self, import_id: DbId) -> Result<ImportLog, ClientError> {
        self.get_json(&format!("/import/status/{import_id}"), NO_QUERY).await
    }

    /// `GET /import/progress/{id}`
    pub async fn import_progress(&self, import_id: DbId) -> Result<ImportProgress, ClientError> {
        self.get_json(&format!("/import/progress/{import_id}"), NO_QUERY)
            .await
    }

    /// `POST /import/retry/{id}`
    pub async fn retry_import(&self, import_id: DbId) -> Result<ImportLog, ClientError> {
        let builder = self.request(Method::POST, &format!("/import/retry/{import_id}"));
        self.send_json(builder).await
    }

    /// `DELETE /import/{id}?deleteData=bool`. With `delete_data` the
    /// imported records are removed along with the log.
    pub async fn delete_import(&self, import_id: DbId, delete_data: bool) -> Result<(), ClientError> {
        let builder = self
            .request(Method::DELETE, &format!("/import/{import_id}"))
            .query(&[("deleteData", delete_data)]);
        self.send_empty(builder).await
    }

    /// `GET /import/template?templateType&format`, returning the template
    /// file bytes.
    pub async fn download_template(
        &self,
        template_type: ImportType,
        format: TemplateFormat,
    ) -> Result<Vec<u8>, ClientError> {
        let builder = self.request(Method::GET, "/import/template").query(&[
            ("templateType", template_type.as_str()),
            ("format", format.as_str()),
        ]);
        self.send_bytes(builder).await
    }

    /// `GET /import/statistics?days=N`. The payload shape is owned by the
    /// backend and passed through as JSON.
    pub async fn import_statistics(&self, days: u32) -> Result<serde_json::Value, ClientError> {
        self.get_json("/import/statistics", &[("days", days.to_string())])
            .await
    }

    // ---- assignees ----

    /// `GET /assignees`
    pub async fn assignees(&self) -> Result<Vec<AssigneeInfo>, ClientError> {
        self.get_json("/assignees", NO_QUERY).await
    }

    /// `POST /assignees`
    pub async fn create_assignee(&self, assignee: &NewAssignee) -> Result<AssigneeInfo, ClientError> {
        let builder = self.request(Method::POST, "/assignees").json(assignee);
        self.send_json(builder).await
    }

    /// `PUT /assignees/{id}`
    pub async fn update_assignee(
        &self,
        assignee_id: DbId,
        update: &AssigneeUpdate,
    ) -> Result<AssigneeInfo, ClientError> {
        let builder = self
            .request(Method::PUT, &format!("/assignees/{assignee_id}"))
            .json(update);
        self.send_json(builder).await
    }

    /// `DELETE /assignees/{id}`
    pub async fn delete_assignee(&self, assignee_id: DbId) -> Result<(), ClientError> {
        let builder = self.request(Method::DELETE, &format!("/assignees/{assignee_id}"));
        self.send_empty(builder).await
    }

    // ---- reference data ----

    /// `GET /filters/departments`
    pub async fn departments(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("/filters/departments", NO_QUERY).await
    }

    /// `GET /filters/priorities`
    pub async fn priorities(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("/filters/priorities", NO_QUERY).await
    }

    /// `GET /filters/ticket-types`
    pub async fn ticket_types(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("/filters/ticket-types", NO_QUERY).await
    }

    // ---- system ----

    /// `GET /actuator/health`
    pub async fn system_health(&self) -> Result<SystemHealth, ClientError> {
        self.get_json("/actuator/health", NO_QUERY).await
    }

    /// `GET /actuator/info`
    pub async fn system_info(&self) -> Result<SystemInfo, ClientError> {
        self.get_json("/actuator/info", NO_QUERY).await
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, format!("{}{}", self.inner.base_url, path))
    }

    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).query(query);
        self.send_json(builder).await
    }

    /// Run a request through the middleware chain and return the response
    /// once it is known to be successful.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let mut request = builder.build()?;
        for middleware in &self.inner.middleware {
            middleware.on_request(&mut request)?;
        }

        let mut response = match self.inner.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                for middleware in &self.inner.middleware {
                    middleware.on_error(&e);
                }
                return Err(ClientError::Request(e));
            }
        };

        for middleware in &self.inner.middleware {
            response = middleware.on_response(response)?;
        }

        Self::ensure_success(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.dispatch(builder).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_bytes(&self, builder: RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let response = self.dispatch(builder).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.dispatch(builder).await?;
        Ok(())
    }

    /// Convert a non-2xx response into [`ClientError::Api`] carrying the
    /// status and body text.
    async fn ensure_success(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
