use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use sitetime::{
    daemon::{args::HostArgs, start_daemon, HostConfig},
    utils::{
        dir::application_path,
        logging::{enable_logging, HOST_PREFIX},
        runtime::single_thread_runtime,
    },
};
use tracing::{error, info};

/// Stdin reads run on a blocking thread that can't be interrupted.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    let args = HostArgs::parse();
    let app_dir = application_path(args.dir.clone())?;
    enable_logging(HOST_PREFIX, &app_dir, args.log, args.log_console)?;
    info!("Started by {:?}", args.caller);

    let config = HostConfig {
        retention: args.retention()?,
    };
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(start_daemon(app_dir, config));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    result.inspect_err(|e| error!("Host stopped with an error {e:?}"))
}
