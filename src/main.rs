use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = querygate::cli::Cli::parse();
    if let Err(e) = querygate::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
