//! HTTP client for the board's REST API
//!
//! Every request is built as an [`OutgoingRequest`], handed to each
//! registered [`RequestHook`] (CSRF and session token by default), and only
//! then sent through `reqwest`. Cookies set by the server land in a shared
//! jar, which is where the CSRF hook reads `csrftoken` from.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::{CsrfHook, OutgoingRequest, RequestHook};
use super::collection::Collection;
use super::{ApiError, ApiResult};
use crate::config::BoardConfig;
use crate::session::Session;
use crate::types::{ApiRoot, ListResponse, Record, Sprint, Task, TaskUpdate};
use crate::utils::today;

/// How a collection fetch merges into the collection
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Fetch this URL instead of the collection's own
    pub url: Option<String>,
    /// Drop records that are not in the response
    pub remove: bool,
    /// Extra query parameters
    pub query: Vec<(String, String)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            url: None,
            remove: true,
            query: Vec::new(),
        }
    }
}

impl FetchOptions {
    /// Keep records that are not in the response
    pub fn merge() -> Self {
        Self {
            remove: false,
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// REST client with request hooks
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    origin: Url,
    token_url: Option<String>,
    timeout: Duration,
    session: Arc<Session>,
    hooks: Vec<Arc<dyn RequestHook>>,
}

impl ApiClient {
    /// Create a client acting on behalf of the page at `origin`.
    ///
    /// The CSRF hook and the session's token hook are installed.
    pub fn new(origin: &str, session: Arc<Session>) -> ApiResult<Self> {
        let origin = parse_url(origin)?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;

        let hooks: Vec<Arc<dyn RequestHook>> =
            vec![Arc::new(CsrfHook::new(jar.clone())), session.clone()];

        Ok(Self {
            http,
            jar,
            origin,
            token_url: None,
            timeout: Duration::from_secs(BoardConfig::DEFAULT_TIMEOUT_SECS),
            session,
            hooks,
        })
    }

    pub fn from_config(config: &BoardConfig, session: Arc<Session>) -> ApiResult<Self> {
        Ok(Self::new(&config.origin, session)?
            .with_token_url(config.token_url.clone())
            .with_timeout(config.request_timeout))
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register an additional hook, run after the built-in ones
    pub fn add_hook(&mut self, hook: Arc<dyn RequestHook>) {
        self.hooks.push(hook);
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Cookies received from (or preset for) the server
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    pub fn is_cross_domain(&self, url: &Url) -> bool {
        url.origin() != self.origin.origin()
    }

    /// Build a request and run every hook over it
    pub fn prepare(&self, method: Method, url: &str) -> ApiResult<OutgoingRequest> {
        let url = parse_url(url)?;
        let cross_domain = self.is_cross_domain(&url);
        let mut request = OutgoingRequest::new(method, url, cross_domain);
        for hook in &self.hooks {
            hook.before_send(&mut request);
        }
        Ok(request)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> ApiResult<Option<Value>> {
        let request = self.prepare(method, url)?;
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(self.timeout);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(%status, %url, "request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// GET a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let value = self.send(Method::GET, url, &[], None).await?;
        Ok(serde_json::from_value(value.unwrap_or(Value::Null))?)
    }

    /// Fetch the API root and its collection URLs
    pub async fn discover(&self, root_url: &str) -> ApiResult<ApiRoot> {
        let root: ApiRoot = self.get_json(root_url).await?;
        tracing::debug!(?root, "discovered API root");
        Ok(root)
    }

    /// Fetch a list endpoint into `collection`, returning the number of
    /// records received.
    pub async fn fetch<R: Record>(
        &self,
        collection: &mut Collection<R>,
        options: FetchOptions,
    ) -> ApiResult<usize> {
        let url = options
            .url
            .clone()
            .unwrap_or_else(|| collection.url().to_string());
        let value = self
            .send(Method::GET, &url, &options.query, None)
            .await?
            .unwrap_or(Value::Null);

        let page = if value.is_null() {
            Default::default()
        } else {
            serde_json::from_value::<ListResponse<R>>(value)?.into_page()
        };

        let records = collection.parse(page);
        let received = records.len();
        collection.set(records, options.remove);
        Ok(received)
    }

    /// Follow the collection's `next` link, appending the page.
    /// Returns `false` when there is no next page.
    pub async fn fetch_next_page<R: Record>(&self, collection: &mut Collection<R>) -> ApiResult<bool> {
        let Some(next) = collection.next().map(str::to_string) else {
            return Ok(false);
        };
        self.fetch(collection, FetchOptions::merge().with_url(next))
            .await?;
        Ok(true)
    }

    /// GET a single record
    pub async fn fetch_record<R: Record>(&self, url: &str) -> ApiResult<R> {
        self.get_json(url).await
    }

    /// Return the cached record for `key`, fetching and caching it when absent
    pub async fn get_or_fetch<R: Record>(
        &self,
        collection: &mut Collection<R>,
        key: R::Key,
    ) -> ApiResult<R> {
        if let Some(record) = collection.get(&key) {
            return Ok(record.clone());
        }
        let url = collection.member_url(&key);
        let record: R = self.fetch_record(&url).await?;
        collection.add(record.clone());
        Ok(record)
    }

    /// Create (POST) or update (PUT) a record, storing the server's copy
    pub async fn save_record<R: Record>(
        &self,
        collection: &mut Collection<R>,
        record: &R,
    ) -> ApiResult<R> {
        let body = serde_json::to_value(record)?;
        let response = match collection.record_url(record) {
            Some(url) => self.send(Method::PUT, &url, &[], Some(&body)).await?,
            None => {
                let url = collection.url().to_string();
                self.send(Method::POST, &url, &[], Some(&body)).await?
            }
        };
        let saved: R = match response {
            Some(value) => serde_json::from_value(value)?,
            None => record.clone(),
        };
        collection.add(saved.clone());
        Ok(saved)
    }

    /// DELETE a record and drop it from the collection
    pub async fn delete_record<R: Record>(
        &self,
        collection: &mut Collection<R>,
        key: &R::Key,
    ) -> ApiResult<()> {
        let url = match collection.get(key) {
            Some(record) => collection
                .record_url(record)
                .unwrap_or_else(|| collection.member_url(key)),
            None => collection.member_url(key),
        };
        self.send(Method::DELETE, &url, &[], None).await?;
        collection.remove(key);
        Ok(())
    }

    /// Move a task to a status column / sprint / position and persist the
    /// change in a single update.
    pub async fn move_task(
        &self,
        tasks: &mut Collection<Task>,
        id: u64,
        status: u8,
        sprint: Option<u64>,
        order: i64,
    ) -> ApiResult<TaskUpdate> {
        let mut task = self.get_or_fetch(tasks, id).await?;
        let update = task.move_to(status, sprint, order, today());
        tracing::debug!(id, ?update, "moving task");
        self.save_record(tasks, &task).await?;
        Ok(update)
    }

    /// Fetch backlog tasks without dropping tasks already loaded
    pub async fn fetch_backlog(&self, tasks: &mut Collection<Task>) -> ApiResult<usize> {
        self.fetch(tasks, FetchOptions::merge().with_query("backlog", "True"))
            .await
    }

    /// Fetch a sprint's tasks into the task collection, keeping other tasks
    pub async fn fetch_sprint_tasks(
        &self,
        sprint: &Sprint,
        tasks: &mut Collection<Task>,
    ) -> ApiResult<usize> {
        match sprint.tasks_url() {
            Some(url) => self.fetch(tasks, FetchOptions::merge().with_url(url)).await,
            None => Ok(0),
        }
    }

    /// Exchange credentials for an API token and store it in the session
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<()> {
        let url = self
            .token_url
            .clone()
            .ok_or(ApiError::MissingField("token_url"))?;
        let body = json!({ "username": username, "password": password });

        let response = self
            .send(Method::POST, &url, &[], Some(&body))
            .await?
            .unwrap_or(Value::Null);
        let token = serde_json::from_value::<TokenResponse>(response)?
            .token
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingField("token"))?;

        self.session.save(Some(&token));
        tracing::info!(username, "logged in");
        Ok(())
    }

    pub fn logout(&self) {
        self.session.delete();
        tracing::info!("logged out");
    }
}

fn parse_url(url: &str) -> ApiResult<Url> {
    Url::parse(url).map_err(|e| ApiError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
