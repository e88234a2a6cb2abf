// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use exercise_bridge_server::activity::StoreCapabilities;
use exercise_bridge_server::bridge::BridgeServer;
use exercise_bridge_server::config::Config;
use exercise_bridge_server::health::{middleware, HealthChecker};
use exercise_bridge_server::logging;
use exercise_bridge_server::pipeline::ExercisePipeline;
use exercise_bridge_server::store::create_store;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bridge port override
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let args = Args::parse();
    let config = Config::load(args.config)?;
    let bridge_port = args.port.unwrap_or(config.server.bridge_port);

    let store = create_store(&config.store)?;
    let capabilities = StoreCapabilities::for_platform_version(&config.store.platform_version);
    info!(
        store = store.store_name(),
        platform_version = %config.store.platform_version,
        "Health store configured"
    );

    let pipeline = Arc::new(ExercisePipeline::new(store, capabilities));

    let health_checker = Arc::new(HealthChecker::new(pipeline.clone()));
    let health_port = config.server.health_port;
    tokio::spawn(async move {
        warp::serve(middleware::routes(health_checker))
            .run(([127, 0, 0, 1], health_port))
            .await;
    });
    info!("Health endpoints listening on port {}", health_port);

    let server = BridgeServer::new(pipeline);
    server.run(bridge_port).await?;

    Ok(())
}
