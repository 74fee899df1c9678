//! Native messaging wire format. Every message is a 32 bit length in native byte order followed
//! by that many bytes of json.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{TabId, TabInfo, WindowId};

/// Browsers may send up to 4GB, anything this big is a broken stream rather than an event.
pub const MAX_INCOMING_MESSAGE: u32 = 64 * 1024 * 1024;

/// Limit browsers enforce on messages sent by a native host.
pub const MAX_OUTGOING_MESSAGE: usize = 1024 * 1024;

/// Events forwarded by the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BrowserEvent {
    TabActivated {
        tab_id: TabId,
        window_id: WindowId,
    },
    TabUpdated {
        tab: TabInfo,
        /// Present only when the update changed the url.
        #[serde(default)]
        changed_url: Option<String>,
    },
    TabRemoved {
        tab_id: TabId,
    },
    WindowFocusChanged {
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    Startup {
        #[serde(default)]
        tabs: Vec<TabInfo>,
        #[serde(default)]
        focused_window_id: Option<WindowId>,
    },
    Installed {
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        tabs: Vec<TabInfo>,
        #[serde(default)]
        focused_window_id: Option<WindowId>,
    },
    ActionClicked,
}

/// Messages sent back to the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    /// Ask the extension to focus the statistics page, opening it when needed.
    OpenStatsPage { path: String },
}

/// Reads a single frame. `None` means the browser closed the pipe between messages, a stream
/// ending anywhere inside a frame is an error.
pub async fn read_frame(reader: &mut (impl AsyncRead + Unpin)) -> Result<Option<Vec<u8>>> {
    let mut length = [0u8; 4];
    let mut filled = 0;
    while filled < length.len() {
        match reader.read(&mut length[filled..]).await? {
            0 if filled == 0 => return Ok(None),
            0 => bail!("Length prefix was cut short after {filled} bytes"),
            read => filled += read,
        }
    }

    let length = u32::from_ne_bytes(length);
    if length > MAX_INCOMING_MESSAGE {
        bail!("Incoming message of {length} bytes exceeds {MAX_INCOMING_MESSAGE}");
    }

    // Grows with the received bytes, the announced length alone allocates nothing.
    let mut buffer = Vec::new();
    let read = (&mut *reader)
        .take(u64::from(length))
        .read_to_end(&mut buffer)
        .await?;
    if read < length as usize {
        bail!("Message was cut short, got {read} of {length} bytes");
    }
    Ok(Some(buffer))
}

pub fn decode_event(frame: &[u8]) -> Result<BrowserEvent> {
    Ok(serde_json::from_slice(frame)?)
}

/// Serializes a message together with its length prefix.
pub fn encode_frame(message: &impl Serialize) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    let length = u32::try_from(body.len()).context("Message is too large")?;

    let mut frame = Vec::with_capacity(body.len() + 4);
    frame.extend_from_slice(&length.to_ne_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

pub async fn write_message(
    writer: &mut (impl AsyncWrite + Unpin),
    message: &HostMessage,
) -> Result<()> {
    let frame = encode_frame(message)?;
    if frame.len() - 4 > MAX_OUTGOING_MESSAGE {
        bail!("Outgoing message of {} bytes exceeds {MAX_OUTGOING_MESSAGE}", frame.len() - 4);
    }
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tokio::io::AsyncWriteExt;

    use crate::browser_api::TabInfo;

    use super::{
        decode_event, encode_frame, read_frame, write_message, BrowserEvent, HostMessage,
        MAX_INCOMING_MESSAGE,
    };

    #[test]
    fn test_decode_events() -> Result<()> {
        assert_eq!(
            decode_event(br#"{"type":"tabActivated","tabId":4,"windowId":1}"#)?,
            BrowserEvent::TabActivated {
                tab_id: 4,
                window_id: 1
            }
        );
        assert_eq!(
            decode_event(
                br#"{"type":"tabUpdated","tab":{"id":4,"windowId":1,"active":true,"url":"https://a.com/x"},"changedUrl":"https://a.com/x"}"#
            )?,
            BrowserEvent::TabUpdated {
                tab: TabInfo {
                    id: 4,
                    window_id: 1,
                    active: true,
                    url: Some("https://a.com/x".into()),
                },
                changed_url: Some("https://a.com/x".into()),
            }
        );
        assert_eq!(
            decode_event(br#"{"type":"windowFocusChanged","windowId":-1}"#)?,
            BrowserEvent::WindowFocusChanged {
                window_id: Some(-1)
            }
        );
        assert_eq!(
            decode_event(br#"{"type":"startup"}"#)?,
            BrowserEvent::Startup {
                tabs: vec![],
                focused_window_id: None
            }
        );
        assert_eq!(
            decode_event(br#"{"type":"actionClicked"}"#)?,
            BrowserEvent::ActionClicked
        );
        Ok(())
    }

    #[test]
    fn test_tab_without_url() -> Result<()> {
        let BrowserEvent::TabUpdated { tab, changed_url } =
            decode_event(br#"{"type":"tabUpdated","tab":{"id":1,"windowId":2}}"#)?
        else {
            panic!("Expected a tab update");
        };
        assert_eq!(tab.url, None);
        assert!(!tab.active);
        assert_eq!(changed_url, None);
        Ok(())
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(decode_event(br#"{"type":"bookmarkAdded"}"#).is_err());
    }

    #[tokio::test]
    async fn test_frames_are_read_in_sequence() -> Result<()> {
        let (mut browser, mut host) = tokio::io::duplex(1024);
        browser
            .write_all(&encode_frame(&BrowserEvent::ActionClicked)?)
            .await?;
        browser
            .write_all(&encode_frame(&BrowserEvent::TabRemoved { tab_id: 3 })?)
            .await?;
        drop(browser);

        let first = read_frame(&mut host).await?.unwrap();
        let second = read_frame(&mut host).await?.unwrap();

        assert_eq!(decode_event(&first)?, BrowserEvent::ActionClicked);
        assert_eq!(decode_event(&second)?, BrowserEvent::TabRemoved { tab_id: 3 });
        assert_eq!(read_frame(&mut host).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_truncated_body_is_an_error() -> Result<()> {
        let (mut browser, mut host) = tokio::io::duplex(1024);
        browser.write_all(&10u32.to_ne_bytes()).await?;
        browser.write_all(b"{}").await?;
        drop(browser);

        assert!(read_frame(&mut host).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_truncated_length_is_an_error() -> Result<()> {
        let (mut browser, mut host) = tokio::io::duplex(1024);
        browser.write_all(&10u32.to_ne_bytes()[..2]).await?;
        drop(browser);

        assert!(read_frame(&mut host).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_huge_announced_length_without_body_is_an_error() -> Result<()> {
        let (mut browser, mut host) = tokio::io::duplex(1024);
        browser.write_all(&MAX_INCOMING_MESSAGE.to_ne_bytes()).await?;
        browser.write_all(b"{}").await?;
        drop(browser);

        let error = read_frame(&mut host).await.unwrap_err();
        assert!(error.to_string().contains("got 2 of"), "{error}");
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_length_is_rejected() -> Result<()> {
        let (mut browser, mut host) = tokio::io::duplex(1024);
        browser
            .write_all(&(MAX_INCOMING_MESSAGE + 1).to_ne_bytes())
            .await?;

        assert!(read_frame(&mut host).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_message() -> Result<()> {
        let (mut host, mut browser) = tokio::io::duplex(1024);
        write_message(
            &mut host,
            &HostMessage::OpenStatsPage {
                path: "stats.html".into(),
            },
        )
        .await?;

        let frame = read_frame(&mut browser).await?.unwrap();
        assert_eq!(
            String::from_utf8(frame)?,
            r#"{"type":"openStatsPage","path":"stats.html"}"#
        );
        Ok(())
    }
}
