use std::{path::PathBuf, sync::Arc};

use accounting::Accountant;
use anyhow::Result;
use storage::{entities::RetentionPolicy, time_storage::JsonTimeStorage};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracking::{ticker::TokioTicker, TrackerEvent, TrackingModule};

use crate::{
    browser_api::protocol::HostMessage,
    utils::clock::{Clock, DefaultClock},
};

pub mod accounting;
pub mod args;
pub mod connection;
pub mod shutdown;
pub mod storage;
pub mod tracking;

const EVENT_QUEUE_SIZE: usize = 32;
const REPLY_QUEUE_SIZE: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    pub retention: Option<RetentionPolicy>,
}

/// Represents the starting point for the native messaging host. Talks to the browser over
/// stdin/stdout until the browser disconnects.
pub async fn start_daemon(dir: PathBuf, config: HostConfig) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    let (_, result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        run_host(
            tokio::io::stdin(),
            tokio::io::stdout(),
            dir,
            config,
            Arc::new(DefaultClock),
            shutdown_token.clone(),
        ),
    );
    result
}

/// Wires the browser connection, tracking and storage together and runs them to completion.
pub async fn run_host(
    reader: impl AsyncRead + Unpin,
    writer: impl AsyncWrite + Unpin,
    dir: PathBuf,
    config: HostConfig,
    clock: Arc<dyn Clock>,
    shutdown_token: CancellationToken,
) -> Result<()> {
    let (events, receiver) = mpsc::channel::<TrackerEvent>(EVENT_QUEUE_SIZE);
    let (replies, outgoing) = mpsc::channel::<HostMessage>(REPLY_QUEUE_SIZE);

    let tracking = create_tracking(
        dir,
        config,
        clock,
        events.clone(),
        receiver,
        replies,
        &shutdown_token,
    )?;

    let (reading_result, tracking_result, writing_result) = tokio::join!(
        connection::read_events(reader, events, shutdown_token.clone()),
        tracking.run(),
        connection::write_replies(writer, outgoing),
    );

    if let Err(e) = &reading_result {
        error!("Connection to the browser failed {e:?}");
    }

    if let Err(e) = &writing_result {
        error!("Replying to the browser failed {e:?}");
    }

    tracking_result.inspect_err(|e| error!("Tracking module got an error {e:?}"))
}

fn create_tracking(
    dir: PathBuf,
    config: HostConfig,
    clock: Arc<dyn Clock>,
    events: mpsc::Sender<TrackerEvent>,
    receiver: mpsc::Receiver<TrackerEvent>,
    replies: mpsc::Sender<HostMessage>,
    shutdown_token: &CancellationToken,
) -> Result<TrackingModule<JsonTimeStorage, TokioTicker>> {
    let storage = JsonTimeStorage::new(dir)?;
    let accountant = Accountant::new(storage, clock.clone(), config.retention);
    let ticker = TokioTicker::new(events, clock, shutdown_token.clone());
    Ok(TrackingModule::new(
        receiver,
        replies,
        ticker,
        accountant,
        shutdown_token.clone(),
    ))
}
