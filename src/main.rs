use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = relay::cli::Cli::parse();
    if let Err(e) = relay::run::execute(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
