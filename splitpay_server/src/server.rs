use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use splitpay_engine::{
    events::EventProducers,
    traits::{PaymentLinkGateway, SplitPaymentDatabase},
    SplitPaymentApi,
    SplitPaymentOptions,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions, WebhookConfig, WEBHOOK_SIGNATURE_HEADER},
    errors::ServerError,
    integrations::{notifications::create_notification_event_handlers, payment_links::HostedPaymentLinks},
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        AbandonSplitPaymentRoute,
        ConfirmSplitPaymentRoute,
        CreateSplitPaymentRoute,
        PaymentLinkCallbackRoute,
        PaymentLinkWebhookRoute,
        ReissuePaymentLinkRoute,
        SplitPaymentStatusForOrderRoute,
        SplitPaymentStatusRoute,
        UnconfirmedSplitPaymentsRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    let gateway = HostedPaymentLinks::new(config.paylink_config.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db.clone(), gateway, producers)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    let mut db = db;
    if let Err(e) = db.close().await {
        warn!("🚀️ Could not close the database cleanly. {e}");
    }
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: HostedPaymentLinks,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = config.split_payment_options();
    let server_options = ServerOptions::from_config(&config);
    let webhook_config = config.webhook_config.clone();
    let srv = HttpServer::new(move || {
        let api = SplitPaymentApi::with_options(db.clone(), gateway.clone(), producers.clone(), options.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(server_options))
            .configure(split_payment_routes::<SqliteDatabase, HostedPaymentLinks>(webhook_config.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The app must carry a `SplitPaymentApi<B, G>` and [`ServerOptions`] as app data.
pub fn split_payment_routes<B, G>(webhook_config: WebhookConfig) -> impl FnOnce(&mut web::ServiceConfig)
where
    B: SplitPaymentDatabase + 'static,
    G: PaymentLinkGateway + 'static,
{
    move |cfg: &mut web::ServiceConfig| {
        let WebhookConfig { hmac_secret, hmac_checks } = webhook_config;
        // `unconfirmed` has to be registered before `{id}`, which would otherwise claim it.
        let api_scope = web::scope("/api")
            .service(CreateSplitPaymentRoute::<B, G>::new())
            .service(UnconfirmedSplitPaymentsRoute::<B, G>::new())
            .service(SplitPaymentStatusForOrderRoute::<B, G>::new())
            .service(SplitPaymentStatusRoute::<B, G>::new())
            .service(ReissuePaymentLinkRoute::<B, G>::new())
            .service(AbandonSplitPaymentRoute::<B, G>::new())
            .service(ConfirmSplitPaymentRoute::<B, G>::new());
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(WEBHOOK_SIGNATURE_HEADER, hmac_secret, hmac_checks))
            .service(PaymentLinkWebhookRoute::<B, G>::new());
        let callback_scope = web::scope("/callback").service(PaymentLinkCallbackRoute::<B, G>::new());
        cfg.service(health).service(api_scope).service(webhook_scope).service(callback_scope);
    }
}
