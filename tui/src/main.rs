use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use snitch_diff_client::DiffApi;
use snitch_diff_client::HttpDiffApi;
use snitch_diff_core::ConfigLoader;
use snitch_diff_tui::Cli;
use snitch_diff_tui::Command;
use snitch_diff_tui::commands;
use snitch_diff_tui::logging;
use snitch_diff_tui::run_view;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The view owns the terminal, so its logs go to a file.
    let _log_guard = match &cli.command {
        Command::View(_) => Some(logging::init_file_logging().context("opening log file")?),
        Command::Dump(_) | Command::Node(_) => {
            logging::init_stderr_logging();
            None
        }
    };

    let mut loader = ConfigLoader::new().with_server_url(cli.server);
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path);
    }
    let config = loader.load().context("loading configuration")?;
    tracing::debug!(server = %config.server_url, "configuration loaded");

    let api = HttpDiffApi::new(config.http_config()).context("building HTTP client")?;

    match cli.command {
        Command::View(args) => {
            let api: Arc<dyn DiffApi> = Arc::new(api);
            run_view(api, args.target(), &config).await?;
        }
        Command::Dump(args) => {
            let target = args.target();
            let report = commands::dump(Arc::new(api), target.clone(), &config).await?;
            println!("{}", report.text);
            if let Some(error) = report.error {
                anyhow::bail!("diff {target} failed: {error}");
            }
        }
        Command::Node(args) => {
            let text = commands::node(
                &api,
                &args.target.target(),
                &args.node_model,
                &args.node_id,
            )
            .await?;
            print!("{text}");
        }
    }
    Ok(())
}
