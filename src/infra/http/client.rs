use async_trait::async_trait;
use placard_api_types::{
    Asset, AssetUpdate, BatchUpdateRequest, CsrfTokenResponse, SaveResponse, UiConfigMap,
    ValueUpdateRequest,
};
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode, Url,
    header::{COOKIE, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::repos::{AssetStore, SnapshotSource, StoreError, WriteAck};
use crate::config::StoreSettings;
use crate::domain::ConfigSnapshot;

pub const CSRF_HEADER: &str = "X-CSRFToken";

const UI_CONFIG_PATH: &str = "api/ui-config";
const ADMIN_ASSETS_PATH: &str = "admin/ui-assets";

/// HTTP adapter for the asset store.
#[derive(Clone, Debug)]
pub struct StoreClient {
    client: Client,
    base: Url,
    csrf_path: String,
    session_cookie: Option<String>,
    csrf_token: Option<String>,
}

impl StoreClient {
    /// Build a client without a CSRF token. Use [`StoreClient::connect`] for
    /// clients that write.
    pub fn new(settings: &StoreSettings) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(StoreError::transport)?;

        Ok(Self {
            client,
            base: normalize_base(&settings.base_url),
            csrf_path: settings.csrf_path.clone(),
            session_cookie: settings.session_cookie.clone(),
            csrf_token: None,
        })
    }

    /// Build a client and fetch its CSRF token once. A missing token is not
    /// an error; writes go out without it and the store decides.
    pub async fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        let mut client = Self::new(settings)?;
        client.csrf_token = client.fetch_csrf_token().await;
        Ok(client)
    }

    pub fn user_agent() -> &'static str {
        concat!("placard/", env!("CARGO_PKG_VERSION"))
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn asset_url(&self, key: &str) -> Result<Url, StoreError> {
        let mut url = self.url(ADMIN_ASSETS_PATH)?;
        url.path_segments_mut()
            .map_err(|()| StoreError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(key);
        Ok(url)
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session_cookie.as_deref() {
            Some(cookie) => match HeaderValue::from_str(cookie) {
                Ok(value) => request.header(COOKIE, value),
                Err(err) => {
                    warn!(error = %err, "Session cookie is not a valid header value; sending without it");
                    request
                }
            },
            None => request,
        }
    }

    fn admin_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.with_session(self.client.request(method, url))
    }

    fn mutation(&self, url: Url) -> RequestBuilder {
        let request = self.admin_request(Method::PUT, url);
        match self.csrf_token.as_deref() {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    async fn fetch_csrf_token(&self) -> Option<String> {
        let url = match self.url(&self.csrf_path) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "CSRF token url is invalid; writes will omit the token");
                return None;
            }
        };

        let result = async {
            let response = self
                .admin_request(Method::GET, url)
                .send()
                .await
                .map_err(StoreError::transport)?;
            read_json::<CsrfTokenResponse>(response).await
        }
        .await;

        match result {
            Ok(body) if !body.csrf_token.is_empty() => {
                debug!("Fetched CSRF token");
                Some(body.csrf_token)
            }
            Ok(_) => {
                warn!("Store issued an empty CSRF token; writes will omit the token");
                None
            }
            Err(err) => {
                warn!(error = %err, "CSRF token unavailable; writes will omit the token");
                None
            }
        }
    }
}

#[async_trait]
impl SnapshotSource for StoreClient {
    async fn fetch_snapshot(&self) -> Result<ConfigSnapshot, StoreError> {
        let url = self.url(UI_CONFIG_PATH)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(StoreError::transport)?;
        let entries: UiConfigMap = read_json(response).await?;
        Ok(ConfigSnapshot::from(entries))
    }
}

#[async_trait]
impl AssetStore for StoreClient {
    async fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let url = self.url(ADMIN_ASSETS_PATH)?;
        let response = self
            .admin_request(Method::GET, url)
            .send()
            .await
            .map_err(StoreError::transport)?;
        read_json(response).await
    }

    async fn update_asset(&self, key: &str, value: &str) -> Result<WriteAck, StoreError> {
        let url = self.asset_url(key)?;
        let body = ValueUpdateRequest {
            value: value.to_string(),
        };
        let response = self
            .mutation(url)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::transport)?;
        read_write_ack(response, 1).await
    }

    async fn update_assets(&self, updates: &[AssetUpdate]) -> Result<WriteAck, StoreError> {
        let url = self.url(ADMIN_ASSETS_PATH)?;
        let body = BatchUpdateRequest {
            updates: updates.to_vec(),
        };
        let response = self
            .mutation(url)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::transport)?;
        read_write_ack(response, updates.len()).await
    }
}

/// Base URL with a trailing slash so relative joins keep any path prefix.
fn normalize_base(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);
    base
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(StoreError::transport)?;
    if !status.is_success() {
        return Err(status_error(status, &bytes));
    }
    serde_json::from_slice(&bytes).map_err(StoreError::decode)
}

/// Interpret a write response. The `{success, message, updated}` envelope
/// is optional; `success: false` is a rejection even on 2xx.
async fn read_write_ack(response: Response, requested: usize) -> Result<WriteAck, StoreError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(StoreError::transport)?;
    let envelope = serde_json::from_slice::<SaveResponse>(&bytes).ok();

    if let Some(SaveResponse {
        success: Some(false),
        message,
        ..
    }) = &envelope
    {
        return Err(StoreError::Rejected {
            message: message
                .clone()
                .unwrap_or_else(|| format!("store refused the update ({status})")),
        });
    }

    if !status.is_success() {
        return Err(status_error(status, &bytes));
    }

    let envelope = envelope.unwrap_or_default();
    Ok(WriteAck {
        updated: envelope.updated.unwrap_or(requested),
        message: envelope.message,
    })
}

fn status_error(status: StatusCode, body: &[u8]) -> StoreError {
    StoreError::Status {
        status: status.as_u16(),
        body: String::from_utf8_lossy(body).trim().to_string(),
    }
}
