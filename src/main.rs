use acevia_server::{app, config::Config, database, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    logging::setup_logging(&config.log_filter);

    let main_db = database::init_main_db(&config.data_path).await?;
    let state = app::AppState::new(main_db, config.data_path.clone());
    let app = app::build_router(state, &config)?;

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
