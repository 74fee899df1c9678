use url::Url;

use super::Hostname;

/// Resolves a candidate url into the hostname time is accounted to. Only http and https pages
/// are tracked. The hostname is whatever the url parser produces: lowercased, without port.
pub fn resolve_hostname(candidate: Option<&str>) -> Option<Hostname> {
    let url = Url::parse(candidate?).ok()?;
    match url.scheme() {
        "http" | "https" => url.host_str().map(Hostname::from),
        _ => None,
    }
}
