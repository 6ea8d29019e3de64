use tracing::{error, Level};
use user_registry::{infrastructure::logger::Logger, AppConfig};

#[tokio::main]
async fn main() {
    Logger::init(Level::INFO);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("配置错误: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = user_registry::run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
