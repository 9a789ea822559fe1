use crate::models::{PlantId, RawPlantRecord};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// The request never produced a response.
    Network,
    Http,
    Parse,
    /// 2xx response whose body carries an `error` field.
    Application,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn network(e: reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Network, e.to_string())
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorKind::Parse, e.to_string())
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self::new(ApiErrorKind::Http, format!("{ctx} ({status}): {body}"))
    }

    pub(crate) fn application(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Application, message)
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub log_level: String,
}

/// Reads the first string-valued key of `window.ENV` from `keys`.
fn env_string(env: &wasm_bindgen::JsValue, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        js_sys::Reflect::get(env, &(*k).into())
            .ok()
            .and_then(|v| v.as_string())
            .filter(|s| !s.trim().is_empty())
    })
}

impl EnvConfig {
    pub fn new() -> Self {
        let window = web_sys::window();

        // Both `window.ENV.API_URL` and `window.ENV.api_url` are accepted.
        let env = window
            .as_ref()
            .and_then(|w| w.get("ENV"))
            .map(wasm_bindgen::JsValue::from)
            .filter(|env| !env.is_undefined() && env.is_object());

        let api_url = env
            .as_ref()
            .and_then(|env| env_string(env, &["API_URL", "api_url"]))
            // The API is normally served by the same host as the page.
            .or_else(|| window.as_ref().and_then(|w| w.location().origin().ok()))
            .filter(|origin| origin.starts_with("http"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let log_level = env
            .as_ref()
            .and_then(|env| env_string(env, &["LOG_LEVEL", "log_level"]))
            .unwrap_or_else(|| "info".to_string());

        Self { api_url, log_level }
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PlantSearchRequest {
    pub term: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PlantIdRequest {
    pub plant_id: PlantId,
}

/// The four catalog endpoints the controllers depend on.
///
/// `ApiClient` is the browser implementation; tests substitute fakes.
pub(crate) trait PlantApi {
    async fn search_plants(&self, term: &str) -> ApiResult<Vec<RawPlantRecord>>;
    async fn like(&self, plant_id: PlantId) -> ApiResult<()>;
    async fn unlike(&self, plant_id: PlantId) -> ApiResult<()>;
    async fn likes(&self, plant_id: PlantId) -> ApiResult<bool>;
}

/// Human readable text for an `error` payload.
///
/// The server sends either a plain string or form errors keyed by field
/// (`{"term": ["This field is required."]}`).
pub(crate) fn error_message(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(fields) => fields
            .iter()
            .map(|(field, msgs)| {
                let text = match msgs {
                    serde_json::Value::Array(items) => items
                        .iter()
                        .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                        .collect::<Vec<_>>()
                        .join(" "),
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{field}: {text}")
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

pub(crate) fn check_application_error(data: serde_json::Value) -> ApiResult<serde_json::Value> {
    match data.get("error") {
        Some(err) if !err.is_null() => Err(ApiError::application(error_message(err))),
        _ => Ok(data),
    }
}

pub(crate) fn parse_plant_list_response(
    data: serde_json::Value,
) -> ApiResult<Vec<RawPlantRecord>> {
    let data = check_application_error(data)?;
    if !data.get("data").is_some_and(|v| v.is_array()) {
        return Err(ApiError::parse(format!(
            "plant list response is missing `data`: {data}"
        )));
    }
    Ok(RawPlantRecord::list_from_response(&data))
}

pub(crate) fn parse_likes_response(data: serde_json::Value) -> ApiResult<bool> {
    let data = check_application_error(data)?;
    data.get("likes")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| ApiError::parse(format!("likes response is missing `likes`: {data}")))
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env(config: &EnvConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    async fn request_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<serde_json::Value> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{method} {url}");

        let mut req = client.request(method, url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    async fn mutate(&self, path: &str, plant_id: PlantId) -> ApiResult<()> {
        let data = self
            .request_json(
                reqwest::Method::POST,
                path,
                Some(&PlantIdRequest { plant_id }),
            )
            .await?;
        check_application_error(data).map(|_| ())
    }
}

impl PlantApi for ApiClient {
    async fn search_plants(&self, term: &str) -> ApiResult<Vec<RawPlantRecord>> {
        let data = self
            .request_json(
                reqwest::Method::POST,
                "/api/get-plant-list",
                Some(&PlantSearchRequest {
                    term: term.to_string(),
                }),
            )
            .await?;
        parse_plant_list_response(data)
    }

    async fn like(&self, plant_id: PlantId) -> ApiResult<()> {
        self.mutate("/api/like", plant_id).await
    }

    async fn unlike(&self, plant_id: PlantId) -> ApiResult<()> {
        self.mutate("/api/unlike", plant_id).await
    }

    async fn likes(&self, plant_id: PlantId) -> ApiResult<bool> {
        let path = format!(
            "/api/likes?plant_id={}",
            urlencoding::encode(&plant_id.to_string())
        );
        let data = self
            .request_json(reqwest::Method::GET, &path, None::<&()>)
            .await?;
        parse_likes_response(data)
    }
}
