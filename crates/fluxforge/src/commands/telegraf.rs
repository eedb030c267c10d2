//! Telegraf configuration command handlers.

use std::path::PathBuf;

use fluxforge_core::Portal;

use crate::cli::{GlobalOpts, TelegrafArgs, TelegrafCommand};
use crate::error::CliError;

pub async fn handle(
    portal: &Portal,
    args: TelegrafArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = portal.client();

    match args.command {
        TelegrafCommand::Show => {
            let config = client.get_telegraf_config().await?;
            if !global.quiet {
                println!("{config}");
            }
            Ok(())
        }

        TelegrafCommand::Download { output } => {
            let config = client.download_telegraf_config().await?;
            let path = output.unwrap_or_else(|| PathBuf::from("telegraf.conf"));
            std::fs::write(&path, &config)?;
            if !global.quiet {
                eprintln!(
                    "Telegraf configuration written to {} ({} bytes)",
                    path.display(),
                    config.len()
                );
            }
            Ok(())
        }
    }
}
