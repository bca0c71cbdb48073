// API client module: a small blocking HTTP client for the vendor fleet API.
// Every request is synchronous; the process waits on each call in turn.
//
// The `FleetApi` trait is the seam the commands and the update workflow are
// written against, so they can be driven by a fake in tests.

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::model::{filter_applications, Application, Board, LogEntry, LogPage, Machine, NotesFilter};

const API_KEY_HEADER: &str = "x-api-key";

/// Status and body of a board PUT. Non-2xx statuses are not errors here;
/// the caller decides what a failed write means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResponse {
    pub status: u16,
    pub body: String,
}

impl PutResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Operations the tool performs against the fleet API.
pub trait FleetApi {
    /// `GET /machine`
    fn machines(&self) -> Result<Vec<Machine>>;

    /// `GET /application`, unfiltered and in API order.
    fn applications(&self) -> Result<Vec<Application>>;

    /// `GET /board?machineId=ID`
    fn boards(&self, machine_id: u64) -> Result<Vec<Board>>;

    /// `GET /log?machineId=ID&count=N`
    fn logs(&self, machine_id: u64, count: usize) -> Result<Vec<LogEntry>>;

    /// `PUT /board/{id}` with the full board record.
    fn update_board(&self, board: &Board) -> Result<PutResponse>;

    /// Fetch a log file by its (pre-signed) URL.
    fn download(&self, url: &str) -> Result<String>;

    /// Applications for one target type and/or notes filter, oldest first.
    fn list_applications(&self, target: Option<&str>, notes: Option<&NotesFilter>) -> Result<Vec<Application>> {
        Ok(filter_applications(self.applications()?, target, notes))
    }
}

/// Blocking client that holds the reqwest client, the API base URL and the
/// two authentication headers sent with every API request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
            auth: auth_headers(config)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");
        let res = self.client.get(&url)
            .headers(self.auth.clone())
            .query(query)
            .send()
            .with_context(|| format!("Failed to send request to {url}"))?;
        let res = ensure_success("GET", path, res)?;
        res.json().with_context(|| format!("Parsing {path} response json"))
    }
}

impl FleetApi for ApiClient {
    fn machines(&self) -> Result<Vec<Machine>> {
        self.get_json("machine", &[])
    }

    fn applications(&self) -> Result<Vec<Application>> {
        self.get_json("application", &[])
    }

    fn boards(&self, machine_id: u64) -> Result<Vec<Board>> {
        self.get_json("board", &[("machineId", machine_id.to_string())])
    }

    fn logs(&self, machine_id: u64, count: usize) -> Result<Vec<LogEntry>> {
        let page: LogPage = self.get_json(
            "log",
            &[("machineId", machine_id.to_string()), ("count", count.to_string())],
        )?;
        Ok(page.data)
    }

    fn update_board(&self, board: &Board) -> Result<PutResponse> {
        let url = self.url(&format!("board/{}", board.id));
        debug!(%url, board_id = board.id, status = board.status(), "PUT");
        let res = self.client.put(&url)
            .headers(self.auth.clone())
            .json(board)
            .send()
            .with_context(|| format!("Failed to send board update to {url}"))?;
        let status = res.status();
        let body = res.text().unwrap_or_default();
        if !status.is_success() {
            warn!(board_id = board.id, %status, "board update rejected");
        }
        Ok(PutResponse { status: status.as_u16(), body })
    }

    fn download(&self, url: &str) -> Result<String> {
        // Log URLs are pre-signed; sending the API headers would break them.
        debug!(%url, "download");
        let res = self.client.get(url)
            .send()
            .with_context(|| format!("Failed to download {url}"))?;
        let res = ensure_success("GET", url, res)?;
        res.text().context("Reading downloaded file")
    }
}

fn auth_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut token = HeaderValue::from_str(&config.credentials.auth_token)
        .context("Auth token contains characters not allowed in a header")?;
    token.set_sensitive(true);
    let mut key = HeaderValue::from_str(&config.credentials.api_key)
        .context("API key contains characters not allowed in a header")?;
    key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, token);
    headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
    Ok(headers)
}

fn ensure_success(method: &str, path: &str, res: Response) -> Result<Response> {
    let status = res.status();
    debug!(method, path, %status, "response");
    if !status.is_success() {
        let txt = res.text().unwrap_or_else(|_| "".into());
        anyhow::bail!("{} {} failed: {} - {}", method, path, status, txt);
    }
    Ok(res)
}
