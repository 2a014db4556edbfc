//! Board context
//!
//! Owns everything a board view needs: configuration, the session, the API
//! client, and the sprint/task/user collections bound to the URLs the API
//! root advertises.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiClient, ApiError, Collection, FetchOptions};
use crate::config::{BoardConfig, ConfigError};
use crate::realtime::{Connector, RealtimeChannel, TungsteniteConnector};
use crate::session::{FileStorage, Session, Storage};
use crate::types::{ApiRoot, Sprint, Task, User};

/// Board bootstrap errors
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Record counts after a refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub sprints: usize,
    pub tasks: usize,
    pub users: usize,
}

pub struct Board {
    pub config: BoardConfig,
    pub session: Arc<Session>,
    pub client: ApiClient,
    pub root: ApiRoot,
    pub sprints: Collection<Sprint>,
    pub tasks: Collection<Task>,
    pub users: Collection<User>,
    connector: Arc<dyn Connector>,
}

impl Board {
    /// Restore the session from `config.storage_path`, discover the API root
    /// and bind the collections to it.
    pub async fn bootstrap(config: BoardConfig) -> Result<Self, BoardError> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.storage_path.clone()));
        Self::bootstrap_with(config, storage).await
    }

    /// Same as [`bootstrap`](Self::bootstrap) over any token storage
    pub async fn bootstrap_with(
        config: BoardConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, BoardError> {
        let session = Arc::new(Session::new(storage));
        session.load();

        let client = ApiClient::from_config(&config, session.clone())?;
        let root = client.discover(&config.api_root).await?;
        tracing::info!(
            api_root = %config.api_root,
            authenticated = session.authenticated(),
            "board ready"
        );

        Ok(Self {
            sprints: Collection::new(root.sprints.clone()),
            tasks: Collection::new(root.tasks.clone()),
            users: Collection::new(root.users.clone()),
            config,
            session,
            client,
            root,
            connector: Arc::new(TungsteniteConnector),
        })
    }

    /// Use `connector` for channels built from now on
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Log in with the configured credentials unless a token is already held.
    /// Returns whether a login request was made.
    pub async fn ensure_login(&self) -> Result<bool, BoardError> {
        if self.session.authenticated() {
            return Ok(false);
        }
        let Some((username, password)) = self.config.credentials() else {
            return Ok(false);
        };
        self.client.login(username, password).await?;
        Ok(true)
    }

    /// Reload all three collections
    pub async fn refresh(&mut self) -> Result<RefreshSummary, BoardError> {
        let sprints = self
            .client
            .fetch(&mut self.sprints, FetchOptions::default())
            .await?;
        let tasks = self
            .client
            .fetch(&mut self.tasks, FetchOptions::default())
            .await?;
        let users = self
            .client
            .fetch(&mut self.users, FetchOptions::default())
            .await?;
        Ok(RefreshSummary {
            sprints,
            tasks,
            users,
        })
    }

    /// Move a task, see [`Task::move_to`]
    pub async fn move_task(
        &mut self,
        id: u64,
        status: u8,
        sprint: Option<u64>,
        order: i64,
    ) -> Result<(), BoardError> {
        self.client
            .move_task(&mut self.tasks, id, status, sprint, order)
            .await?;
        Ok(())
    }

    /// Closed channel for the configured socket URL
    pub fn channel(&self) -> Option<RealtimeChannel> {
        self.config
            .socket_url
            .as_ref()
            .map(|url| self.channel_at(url.clone()))
    }

    /// Closed channel for a sprint's `channel` link
    pub fn sprint_channel(&self, sprint: &Sprint) -> Option<RealtimeChannel> {
        sprint
            .channel_url()
            .map(|url| self.channel_at(url.to_string()))
    }

    fn channel_at(&self, url: String) -> RealtimeChannel {
        RealtimeChannel::new(url, self.connector.clone())
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("root", &self.root)
            .field("sprints", &self.sprints.len())
            .field("tasks", &self.tasks.len())
            .field("users", &self.users.len())
            .finish()
    }
}
