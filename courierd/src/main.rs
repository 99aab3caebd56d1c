use clap::{Args, Parser, Subcommand};
use rst_common::with_tokio::tokio;

use prople_courierd::errors::CourierError;
use prople_courierd::svc::rpc::{init_tracing, Rpc};

#[derive(Parser)]
#[command(name = "courierd")]
#[command(version = "0.1")]
#[command(about = "Prople Courier agent daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configured agent through JSON-RPC
    Rpc(ConfigArgs),

    /// Print the JSON-RPC methods published by the configured agent
    Methods(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<(), CourierError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Rpc(args) => {
            init_tracing();

            let svc = Rpc::new(&args.config)?.svc().await?;
            svc.serve()
                .await
                .map_err(|err| CourierError::RpcError(err.to_string()))?;
        }
        Commands::Methods(args) => {
            let methods = Rpc::new(&args.config)?.methods().await?;
            for method in methods.iter() {
                println!("{}", method);
            }
        }
    }

    Ok(())
}
