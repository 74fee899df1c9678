use anyhow::Result;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::browser_api::protocol::{decode_event, read_frame, write_message, HostMessage};

use super::tracking::TrackerEvent;

/// Reads events sent by the browser and queues them for tracking. A message that can't be
/// understood is skipped, a broken frame ends the connection.
pub async fn read_events(
    mut reader: impl AsyncRead + Unpin,
    events: mpsc::Sender<TrackerEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    let result = loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break Ok(()),
            frame = read_frame(&mut reader) => frame,
        };

        match frame {
            Ok(Some(frame)) => match decode_event(&frame) {
                Ok(event) => {
                    debug!("Received {event:?}");
                    if events.send(TrackerEvent::Browser(event)).await.is_err() {
                        break Ok(());
                    }
                }
                Err(e) => warn!(
                    "Skipping message {}: {e}",
                    String::from_utf8_lossy(&frame)
                ),
            },
            Ok(None) => {
                info!("Browser closed stdin");
                break Ok(());
            }
            Err(e) => {
                error!("Failed to read message {e:?}");
                break Err(e);
            }
        }
    };

    // Tracking drains everything queued before this one.
    let _ = events.send(TrackerEvent::Disconnected).await;
    result
}

/// Sends replies to the browser until every reply sender is dropped.
pub async fn write_replies(
    mut writer: impl AsyncWrite + Unpin,
    mut replies: mpsc::Receiver<HostMessage>,
) -> Result<()> {
    while let Some(message) = replies.recv().await {
        debug!("Sending {message:?}");
        write_message(&mut writer, &message)
            .await
            .inspect_err(|e| error!("Failed to send {message:?}: {e:?}"))?;
    }
    Ok(())
}
