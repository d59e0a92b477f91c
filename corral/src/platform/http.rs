//! Platform client over the resource manager's REST API.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::types::{AppId, AppReport, AppState, FinalStatus, LaunchRequest, Platform};
use crate::error::{CorralError, CorralResult};
use crate::http::{HttpClient, HttpError, ReqwestClient, Timeouts};

const APPS_PATH: &str = "/ws/v1/cluster/apps";

#[derive(Debug, Deserialize)]
struct AppsEnvelope {
    apps: Option<AppList>,
}

#[derive(Debug, Deserialize)]
struct AppList {
    #[serde(default)]
    app: Vec<WireApp>,
}

#[derive(Debug, Deserialize)]
struct AppEnvelope {
    app: WireApp,
}

#[derive(Debug, Deserialize)]
struct NewApplication {
    #[serde(rename = "application-id")]
    application_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireApp {
    id: String,
    name: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    queue: String,
    state: AppState,
    #[serde(default)]
    final_status: FinalStatus,
    #[serde(default)]
    diagnostics: String,
    #[serde(default)]
    application_type: String,
    #[serde(default, rename = "amRPCAddress")]
    am_rpc_address: Option<String>,
    #[serde(default)]
    tracking_url: Option<String>,
    #[serde(default)]
    started_time: i64,
    #[serde(default)]
    finished_time: i64,
}

impl From<WireApp> for AppReport {
    fn from(w: WireApp) -> Self {
        Self {
            id: AppId(w.id),
            name: w.name,
            app_type: w.application_type,
            user: w.user,
            queue: w.queue,
            state: w.state,
            final_status: w.final_status,
            diagnostics: w.diagnostics,
            rpc_address: w.am_rpc_address.filter(|a| !a.is_empty() && a != "N/A"),
            tracking_url: w.tracking_url,
            start_time: w.started_time,
            finish_time: w.finished_time,
        }
    }
}

/// [`Platform`] implementation speaking JSON to the resource manager.
pub struct HttpPlatform<C: HttpClient = ReqwestClient> {
    client: C,
    base_url: String,
    user: String,
}

impl HttpPlatform<ReqwestClient> {
    /// Connect to the resource manager at `url` as `user`.
    pub fn connect(url: &str, user: &str, timeouts: Timeouts) -> CorralResult<Self> {
        let client = ReqwestClient::new(timeouts).map_err(|e| CorralError::Platform(e.to_string()))?;
        Ok(Self::with_client(client, url, user))
    }
}

impl<C: HttpClient> HttpPlatform<C> {
    pub fn with_client(client: C, url: &str, user: &str) -> Self {
        Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            user: user.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, APPS_PATH, path)
    }

    fn parse<T: for<'de> Deserialize<'de>>(&self, what: &str, body: &[u8]) -> CorralResult<T> {
        serde_json::from_slice(body)
            .map_err(|e| CorralError::Platform(format!("Unparseable {} response: {}", what, e)))
    }

    fn submission_body(id: &str, request: &LaunchRequest) -> serde_json::Value {
        let environment: Vec<_> = request
            .env
            .iter()
            .map(|(k, v)| json!({ "key": k, "value": v }))
            .collect();
        let resources: Vec<_> = request
            .resources
            .iter()
            .map(|r| {
                json!({
                    "key": r.name,
                    "value": {
                        "resource": r.source.display().to_string(),
                        "type": "FILE",
                        "visibility": "APPLICATION",
                    }
                })
            })
            .collect();

        json!({
            "application-id": id,
            "application-name": request.name,
            "application-type": request.app_type,
            "queue": request.queue,
            "priority": request.priority,
            "max-app-attempts": request.max_attempts,
            "keep-containers-across-application-attempts": request.keep_containers_over_restarts,
            "resource": { "memory": request.memory, "vCores": request.cores },
            "am-container-spec": {
                "commands": { "command": request.command.join(" ") },
                "environment": { "entry": environment },
                "local-resources": { "entry": resources },
            },
        })
    }
}

fn platform_error(context: &str, e: HttpError) -> CorralError {
    if e.is_timeout() {
        CorralError::TimedOut(format!("{}: {}", context, e))
    } else {
        CorralError::Platform(format!("{}: {}", context, e))
    }
}

impl<C: HttpClient> Platform for HttpPlatform<C> {
    fn user(&self) -> String {
        self.user.clone()
    }

    fn list_instances(&self, app_type: &str) -> CorralResult<Vec<AppReport>> {
        let url = self.url(&format!("?applicationTypes={}&user={}", app_type, self.user));
        let body = self
            .client
            .get(&url)
            .map_err(|e| platform_error("Failed to list applications", e))?;
        let envelope: AppsEnvelope = self.parse("application list", &body)?;
        let reports: Vec<AppReport> = envelope
            .apps
            .map(|list| list.app)
            .unwrap_or_default()
            .into_iter()
            .map(AppReport::from)
            .collect();
        debug!(count = reports.len(), app_type, "Listed applications");
        Ok(reports)
    }

    fn report(&self, id: &AppId) -> CorralResult<Option<AppReport>> {
        match self.client.get(&self.url(&format!("/{}", id))) {
            Ok(body) => {
                let envelope: AppEnvelope = self.parse("application report", &body)?;
                Ok(Some(envelope.app.into()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(platform_error(&format!("Failed to get report for {}", id), e)),
        }
    }

    fn submit(&self, request: &LaunchRequest) -> CorralResult<AppId> {
        let body = self
            .client
            .post_json(&self.url("/new-application"), "")
            .map_err(|e| platform_error("Failed to obtain an application id", e))?;
        let created: NewApplication = self.parse("new application", &body)?;

        let submission = Self::submission_body(&created.application_id, request).to_string();
        self.client
            .post_json(&self.url(""), &submission)
            .map_err(|e| platform_error(&format!("Failed to submit {}", request.name), e))?;

        info!(instance = %request.name, app = %created.application_id, "Submitted application");
        Ok(AppId(created.application_id))
    }

    fn kill(&self, id: &AppId, reason: &str) -> CorralResult<()> {
        let body = json!({ "state": "KILLED", "diagnostics": reason }).to_string();
        self.client
            .put_json(&self.url(&format!("/{}/state", id)), &body)
            .map_err(|e| platform_error(&format!("Failed to kill {}", id), e))?;
        info!(app = %id, reason, "Killed application");
        Ok(())
    }
}
