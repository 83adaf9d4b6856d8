//! HMAC middleware for Actix Web.
//!
//! This module provides a middleware for Actix Web that checks the HMAC signature of incoming requests.
//!
//! The payment link gateway signs every webhook call with HMAC-SHA256, using the shared webhook secret
//! (`SPG_WEBHOOK_SECRET`) as the key and the raw request body as the data. The base64-encoded signature is sent in the
//! header configured for the middleware (see [`crate::config::WEBHOOK_SIGNATURE_HEADER`]).
//!
//! Wrap the webhook routes with this middleware so that forged payment notifications never reach the split payment
//! engine.

use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace, warn};
use splitpay_common::Secret;

use crate::helpers::verify_hmac;

/// What the middleware checks. Shared by every worker's service instance.
#[derive(Debug)]
struct SignatureCheck {
    header: String,
    secret: Secret<String>,
    /// When false, every request is let through unchecked
    enabled: bool,
}

pub struct HmacMiddlewareFactory {
    check: Arc<SignatureCheck>,
}

impl HmacMiddlewareFactory {
    pub fn new(hmac_header: &str, secret: Secret<String>, enabled: bool) -> Self {
        let check = SignatureCheck { header: hmac_header.to_string(), secret, enabled };
        Self { check: Arc::new(check) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { check: Arc::clone(&self.check), service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    check: Arc<SignatureCheck>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let check = Arc::clone(&self.check);
        Box::pin(async move {
            if !check.enabled {
                trace!("🔐️ HMAC checks are disabled. Allowing {}", req.path());
                return service.call(req).await;
            }
            let signature = req
                .headers()
                .get(check.header.as_str())
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .ok_or_else(|| {
                    warn!("🔐️ No {} header on request to {}. Denying access.", check.header, req.path());
                    ErrorForbidden("No HMAC signature found.")
                })?;
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request body: {e:?}");
                ErrorBadRequest("Failed to extract request data.")
            })?;
            if !verify_hmac(check.secret.reveal(), &body, &signature) {
                warn!("🔐️ Invalid HMAC signature on request to {}. Denying access.", req.path());
                return Err(ErrorForbidden("Invalid HMAC signature."));
            }
            debug!("🔐️ HMAC check for {} ✅️", req.path());
            // The body was consumed to check it, so put it back for the handler
            req.set_payload(bytes_to_payload(body));
            service.call(req).await
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
