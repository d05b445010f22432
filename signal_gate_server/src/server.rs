use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use signal_gate_engine::{PostbackApi, SqliteDatabase, VerificationApi};
use telegram_tools::TelegramApi;

use crate::{
    check_worker::start_check_worker,
    config::ServerConfig,
    data_objects::PostbackAuth,
    dispatcher::{DispatcherConfig, UpdateDispatcher},
    errors::ServerError,
    routes::{health, PostbackRoute, WebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = TelegramApi::new(config.telegram.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    start_check_worker(db.clone(), gateway.clone(), config.min_deposit, DispatcherConfig::from(&config));
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: TelegramApi,
) -> Result<Server, ServerError> {
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let postback_api = PostbackApi::new(db.clone());
        let verifier = VerificationApi::new(db.clone(), config.min_deposit);
        let dispatcher = UpdateDispatcher::new(verifier, gateway.clone(), DispatcherConfig::from(&config));
        let postback_auth = PostbackAuth::new(config.postback_token.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sgs::access_log"))
            .app_data(web::Data::new(postback_api))
            .app_data(web::Data::new(dispatcher))
            .app_data(web::Data::new(postback_auth))
            .service(health)
            .service(PostbackRoute::<SqliteDatabase>::new())
            .service(WebhookRoute::<SqliteDatabase, TelegramApi>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
