use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use b3_screener::models::Config;
use b3_screener::pipeline;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter("b3_screener=info")
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    match pipeline::run(config).await {
        Ok(path) => {
            info!("✅ Screening run finished");
            println!("Shortlist written to {}", path.display());
        }
        Err(e) => {
            error!("Screening run failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}
