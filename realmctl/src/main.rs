use clap::Parser;
use realmctl::{cli, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before anything else that might build a TLS client
    realmctl::install_crypto_provider();

    let args = cli::Args::parse();

    telemetry::init_telemetry(args.verbose)?;

    if let Err(err) = cli::run(args).await {
        err.log();
        eprintln!("{}", err.user_message());
        std::process::exit(1);
    }

    Ok(())
}
