// src/main.rs

use tasklane::config::{default_config_path, load_and_validate};
use tasklane::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("tasklane error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;
    logging::init_logging(args.log_level, cfg.config.log_file.as_deref())?;
    run(args, cfg).await
}
