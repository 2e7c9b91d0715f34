use clap::Parser;
use flexstore_server::{ServerConfig, ServerError, logging};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = ServerConfig::parse();
    logging::init(config.log_json);

    flexstore_server::run(config).await
}
