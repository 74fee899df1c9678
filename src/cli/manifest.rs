use std::{env, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use super::host_path::to_host_path;

/// Name the extension uses to connect to the host.
pub const HOST_NAME: &str = "io.sitetime.host";

#[derive(Debug, Parser)]
pub struct ManifestCommand {
    #[arg(
        long = "extension-id",
        required = true,
        help = "Id of the extension allowed to talk to the host. Can be repeated"
    )]
    extension_ids: Vec<String>,
}

/// Native messaging host manifest, see the browser documentation for the meaning of each field.
#[derive(Debug, Serialize)]
pub struct HostManifest {
    name: &'static str,
    description: &'static str,
    path: PathBuf,
    #[serde(rename = "type")]
    kind: &'static str,
    allowed_origins: Vec<String>,
}

impl HostManifest {
    pub fn new(host_path: PathBuf, extension_ids: &[String]) -> Self {
        Self {
            name: HOST_NAME,
            description: env!("CARGO_PKG_DESCRIPTION"),
            path: host_path,
            kind: "stdio",
            allowed_origins: extension_ids
                .iter()
                .map(|id| format!("chrome-extension://{id}/"))
                .collect(),
        }
    }
}

/// Prints the manifest for the host installed next to the current executable.
pub fn process_manifest_command(ManifestCommand { extension_ids }: ManifestCommand) -> Result<()> {
    let host_path = to_host_path(env::current_exe()?);
    let manifest = HostManifest::new(host_path, &extension_ids);
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Result;

    use super::HostManifest;

    #[test]
    fn test_manifest_layout() -> Result<()> {
        let manifest = HostManifest::new(
            PathBuf::from("/opt/sitetime/sitetime-host"),
            &["abcdefghijklmnop".to_string()],
        );

        let value = serde_json::to_value(&manifest)?;
        assert_eq!(value["name"], "io.sitetime.host");
        assert_eq!(value["type"], "stdio");
        assert_eq!(value["path"], "/opt/sitetime/sitetime-host");
        assert_eq!(
            value["allowed_origins"],
            serde_json::json!(["chrome-extension://abcdefghijklmnop/"])
        );
        Ok(())
    }
}
