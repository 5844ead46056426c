use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};

mod builder;
mod config;
mod dto;
mod error;
mod handlers;
mod helper;
mod response;
mod reward;
mod rpc;
mod validate;

use config::AppConfig;
use handlers::{AppState, configure, cors_headers, json_config};
use reward::{QUEUE_CAPACITY, RewardMintDispatcher, RewardMinter};
use rpc::{ChainRpc, HttpRpcClient};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    let addr = config.bind_addr();

    let client = HttpRpcClient::new(config.rpc_url.clone(), config.rpc_timeout)
        .map_err(std::io::Error::other)?;
    log::info!("using cluster rpc {}", client.url());
    let rpc: Arc<dyn ChainRpc> = Arc::new(client);

    let dispatcher = match &config.reward {
        Some(reward) => {
            log::info!("minting rewards from {}", reward.mint);
            let minter = RewardMinter::new(
                rpc.clone(),
                reward.mint,
                reward.authority.clone(),
                config.explorer_cluster.clone(),
            );
            RewardMintDispatcher::start(minter, QUEUE_CAPACITY)
        }
        None => {
            log::warn!("MINT_AUTHORITY_SECRET not set, reward minting disabled");
            RewardMintDispatcher::disabled()
        }
    };

    let state = web::Data::new(AppState {
        rpc,
        dispatcher,
        default_recipient: config.default_recipient,
        base_url: config.base_url.clone(),
    });

    log::info!("Server is running on {} ({})", addr, config.base_url);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors_headers())
            .app_data(json_config())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&addr)?
    .run()
    .await
}
