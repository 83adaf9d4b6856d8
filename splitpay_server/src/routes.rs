//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database or gateway call in here is therefore async.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use splitpay_engine::{
    db_types::OrderId,
    split_payment_objects::NewSplitPayment,
    traits::{CoPaymentRef, ContributorSignal, PaymentLinkGateway, SplitPaymentDatabase},
    SplitPaymentApi,
    SplitPaymentError,
};

use crate::{
    config::ServerOptions,
    data_objects::{signal_status, JsonResponse, PaymentLinkCallback, PaymentLinkNotification},
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Split payments  ----------------------------------------------------
route!(create_split_payment => Post "/split_payments" impl SplitPaymentDatabase, PaymentLinkGateway);
/// Route handler for creating a split payment
///
/// The body is a [`NewSplitPayment`]: the draft order and the contributors with their shares. The shares must add up
/// to the order's final amount. A payment link is requested for every contributor. Contributors whose link could not
/// be issued are reported with an error message and can be retried with the `reissue` endpoint.
pub async fn create_split_payment<B, G>(
    body: web::Json<NewSplitPayment>,
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST split payment for {} contributors", request.contributors.len());
    let created = api.create_split_payment(request).await?;
    info!(
        "💻️ Split payment #{} for order {} created. {} of {} payment links issued.",
        created.co_payment_id,
        created.order_id,
        created.links_issued(),
        created.contributors.len()
    );
    Ok(HttpResponse::Created().json(created))
}

route!(reissue_payment_link => Post "/split_payments/{id}/contributors/{contributor_id}/reissue" impl SplitPaymentDatabase, PaymentLinkGateway);
pub async fn reissue_payment_link<B, G>(
    path: web::Path<(i64, i64)>,
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let (co_payment_id, contributor_id) = path.into_inner();
    debug!("💻️ POST reissue payment link for contributor #{contributor_id} on co-payment #{co_payment_id}");
    let result = api.reissue_payment_link(co_payment_id, contributor_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(unconfirmed_split_payments => Get "/split_payments/unconfirmed" impl SplitPaymentDatabase, PaymentLinkGateway);
/// Completed co-payments whose order has not been confirmed yet. Anything in this list needs an operator.
pub async fn unconfirmed_split_payments<B, G>(
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    debug!("💻️ GET unconfirmed split payments");
    let co_payments = api.confirmation().unconfirmed().await?;
    Ok(HttpResponse::Ok().json(co_payments))
}

route!(split_payment_status => Get "/split_payments/{id}" impl SplitPaymentDatabase, PaymentLinkGateway);
pub async fn split_payment_status<B, G>(
    path: web::Path<i64>,
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let id = path.into_inner();
    trace!("💻️ GET status for co-payment #{id}");
    let snapshot = api.status(&CoPaymentRef::Id(id)).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

route!(split_payment_status_for_order => Get "/split_payments/order/{order_id}" impl SplitPaymentDatabase, PaymentLinkGateway);
pub async fn split_payment_status_for_order<B, G>(
    path: web::Path<OrderId>,
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let order_id = path.into_inner();
    trace!("💻️ GET status for the co-payment of order {order_id}");
    let snapshot = api.status_for_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

route!(abandon_split_payment => Post "/split_payments/{id}/abandon" impl SplitPaymentDatabase, PaymentLinkGateway);
pub async fn abandon_split_payment<B, G>(
    path: web::Path<i64>,
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let id = path.into_inner();
    info!("💻️ POST abandon co-payment #{id}");
    let snapshot = api.abandon(id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

route!(confirm_split_payment => Post "/split_payments/{id}/confirm" impl SplitPaymentDatabase, PaymentLinkGateway);
/// Confirms the order for a completed co-payment whose automatic confirmation failed.
pub async fn confirm_split_payment<B, G>(
    path: web::Path<i64>,
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let id = path.into_inner();
    info!("💻️ POST confirm the order for co-payment #{id}");
    let outcome = api.confirmation().confirm(id).await?;
    let snapshot = api.status(&CoPaymentRef::Id(outcome.co_payment.id)).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

//----------------------------------------------   Gateway signals  ----------------------------------------------------
route!(payment_link_webhook => Post "/payment_link" impl SplitPaymentDatabase, PaymentLinkGateway);
/// Route handler for the payment link webhook
///
/// The gateway calls this whenever a payment link changes state. The body signature has already been checked by the
/// HMAC middleware by the time we get here.
///
/// A link that we do not know about is acknowledged with a failure message rather than an error, so that the gateway
/// does not keep retrying the delivery.
pub async fn payment_link_webhook<B, G>(
    req: HttpRequest,
    body: web::Json<PaymentLinkNotification>,
    api: web::Data<SplitPaymentApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "an unknown address".to_string());
    let notification = body.into_inner();
    debug!("💻️ Payment link webhook from {peer}: {notification:?}");
    if notification.co_payment().is_none() {
        return Err(ServerError::InvalidRequestBody(
            "The notification must carry a co_payment_id or an order_id".to_string(),
        ));
    }
    let Some(signal) = notification.signal() else {
        trace!("💻️ Payment link {} is {}. Nothing to do.", notification.payment_link_id, notification.status);
        return Ok(HttpResponse::Ok().json(JsonResponse::success("Nothing to do.")));
    };
    match api.process_signal(signal).await {
        Ok(receipt) => {
            let message = format!(
                "Co-payment #{} is {} ({}% complete).",
                receipt.snapshot.co_payment_id, receipt.snapshot.status, receipt.snapshot.completion_percentage
            );
            Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
        },
        Err(e @ SplitPaymentError::PaymentLinkNotFound(_)) => {
            warn!("💻️ Ignoring a webhook call from {peer} for an unknown payment link. {e}");
            Ok(HttpResponse::Ok().json(JsonResponse::failure(e)))
        },
        Err(e) => {
            warn!("💻️ Could not process payment link webhook from {peer}. {e}");
            Err(e.into())
        },
    }
}

route!(payment_link_callback => Get "/split_payments/{id}" impl SplitPaymentDatabase, PaymentLinkGateway);
/// Where the gateway sends the payer once they have finished on the hosted payment page. The link status in the query
/// string is applied like any other signal, and the payer sees how far along the co-payment is.
pub async fn payment_link_callback<B, G>(
    path: web::Path<i64>,
    query: web::Query<PaymentLinkCallback>,
    api: web::Data<SplitPaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    let id = path.into_inner();
    let PaymentLinkCallback { payment_link_id, payment_link_status } = query.into_inner();
    debug!("💻️ Payer returned for co-payment #{id} with link {payment_link_id} ({payment_link_status})");
    let snapshot = match signal_status(payment_link_status) {
        Some(status) => {
            let signal = ContributorSignal::new(id, payment_link_id, status);
            api.process_signal(signal).await?.snapshot
        },
        None => api.status(&CoPaymentRef::Id(id)).await?,
    };
    Ok(HttpResponse::Ok().json(snapshot))
}
