use clap::Parser;
use mail_dispatch::{ConfigLoader, MailDispatcher};

use crate::cli::Cli;

mod cli;
mod logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _handle = logging::init_logging(cli.log_level.into())?;
    dispatcher_for(&cli).send(&cli.recipient, &cli.content, &cli.subject);
    Ok(())
}

fn dispatcher_for(cli: &Cli) -> MailDispatcher {
    MailDispatcher::new(ConfigLoader::new(cli.get_config_path()))
}
