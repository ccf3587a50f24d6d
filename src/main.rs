mod backend;
mod config;
mod console;
mod interpret;
mod request;
mod selector;
mod snapshot;
mod terminal;
mod types;

use backend::HttpBackend;
use config::Config;
use console::ConsoleRenderer;
use env_logger::Env;
use log::{error, info};
use terminal::Terminal;
use tokio::io::BufReader;

#[macro_use]
extern crate failure;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting plate-terminal");

    if let Err(e) = run().await {
        error!("plate-terminal failed: {}", e);
        std::process::exit(1);
    }
    info!("Exiting main");
}

async fn run() -> Result<(), failure::Error> {
    let config = Config::from_env()?;
    info!("Using recognition backend at {}", config.backend_url);
    let backend = HttpBackend::new(&config.backend_url)?;
    let mut terminal = Terminal::new(ConsoleRenderer::new(std::io::stdout()));
    terminal.notice("Ketik 'help' untuk daftar perintah.");
    console::run(backend, &mut terminal, BufReader::new(tokio::io::stdin())).await
}
