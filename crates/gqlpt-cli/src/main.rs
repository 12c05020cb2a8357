#![cfg_attr(test, allow(unused_crate_dependencies))]

use args::SubCommand;
use clap::crate_version;
use tokio::runtime;

mod args;
mod generate;
mod output;
mod scan;

const THREAD_NAME: &str = "gqlpt";

fn main() -> anyhow::Result<()> {
    let args = self::args::parse();
    args.init_logging();

    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(THREAD_NAME)
        .build()?;

    runtime.block_on(async move {
        tracing::debug!("gqlpt {}", crate_version!());

        match args.command {
            SubCommand::Generate(command) => generate::run(command).await,
        }
    })
}
