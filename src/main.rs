//! board-watch: load a board and follow its realtime events
//!
//! Configuration comes from `BOARD_*` environment variables, see
//! [`scrum_board::config`]. Logging is controlled with `RUST_LOG`.

use scrum_board::realtime::ChannelEvent;
use scrum_board::{Board, BoardConfig, BoardResult};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> BoardResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scrum_board=info")),
        )
        .init();

    let config = BoardConfig::from_env()?;
    let mut board = Board::bootstrap(config).await?;

    if board.ensure_login().await? {
        tracing::info!("session token stored");
    }

    let summary = board.refresh().await?;
    tracing::info!(
        sprints = summary.sprints,
        tasks = summary.tasks,
        users = summary.users,
        "board loaded"
    );

    let Some(channel) = board.channel() else {
        tracing::info!("BOARD_SOCKET_URL not set, not following realtime events");
        return Ok(());
    };

    let mut events = channel.subscribe();
    channel.open();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = events.recv() => match next {
                Ok(named) => match named.event {
                    ChannelEvent::Change(change) => {
                        tracing::info!(event = %named.name, id = %change.id, "change");
                    }
                    ChannelEvent::Message { .. } => {}
                    ChannelEvent::Error { message } => {
                        tracing::warn!(%message, "channel error");
                    }
                    ChannelEvent::Closed => {
                        tracing::info!("channel closed, exiting");
                        return Ok(());
                    }
                    ChannelEvent::Open => {}
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    channel.close();
    Ok(())
}
