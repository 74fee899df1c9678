use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. Returns once a signal arrives or another module
/// requested shutdown.
///
/// Browsers normally end the host by closing stdin, signals only matter when the host is run by
/// hand.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
