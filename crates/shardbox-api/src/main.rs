use shardbox_api::{logging, setup};
use shardbox_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    logging::init_logging();

    let config = Config::from_env()?;

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
