use log::*;
use paylink_tools::{LinkCustomer, NewPaymentLink, PaymentLinkApi, PaymentLinkApiError, PaymentLinkConfig};
use splitpay_engine::traits::{GatewayError, IssuedPaymentLink, PaymentLinkGateway, PaymentLinkRequest};

/// Issues contributor payment links through the hosted payment-link gateway.
#[derive(Clone)]
pub struct HostedPaymentLinks {
    api: PaymentLinkApi,
}

impl HostedPaymentLinks {
    pub fn new(config: PaymentLinkConfig) -> Result<Self, PaymentLinkApiError> {
        if !config.is_configured() {
            warn!("🔗️ The payment link gateway credentials are not set. Every payment link request will fail.");
        }
        let api = PaymentLinkApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentLinkGateway for HostedPaymentLinks {
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<IssuedPaymentLink, GatewayError> {
        let reference = request.reference_id.clone();
        let link = new_payment_link_from_request(request);
        match self.api.create_payment_link(link).await {
            Ok(link) => Ok(IssuedPaymentLink { id: link.id, short_url: link.short_url }),
            Err(e) => {
                warn!("🔗️ Could not issue payment link for {reference}. {e}");
                Err(gateway_error(e))
            },
        }
    }
}

/// The gateway texts and emails the link to the payer, using whichever contact details they gave.
pub fn new_payment_link_from_request(request: PaymentLinkRequest) -> NewPaymentLink {
    let PaymentLinkRequest { amount, currency, payer, reference_id, description, callback_url } = request;
    let notify_sms = payer.phone.is_some();
    let notify_email = payer.email.is_some();
    let customer = LinkCustomer { name: payer.name, email: payer.email, contact: payer.phone };
    let link = NewPaymentLink::new(amount.value(), currency, reference_id, customer)
        .with_description(description)
        .with_notifications(notify_sms, notify_email);
    match callback_url {
        Some(url) => link.with_callback(url),
        None => link,
    }
}

fn gateway_error(e: PaymentLinkApiError) -> GatewayError {
    if e.is_retryable() {
        GatewayError::Unavailable(e.to_string())
    } else {
        GatewayError::Rejected(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use splitpay_common::Paise;
    use splitpay_engine::traits::Payer;

    use super::*;

    fn request(callback_url: Option<String>) -> PaymentLinkRequest {
        PaymentLinkRequest {
            amount: Paise::from_rupees(300),
            currency: "INR".into(),
            payer: Payer { name: "Asha".into(), email: Some("asha@example.com".into()), phone: None },
            reference_id: "CK20240611-ABC123-1".into(),
            description: "Your share of order CK20240611-ABC123".into(),
            callback_url,
        }
    }

    #[test]
    fn link_requests_become_gateway_requests() {
        let link = new_payment_link_from_request(request(Some("https://cakes.example.com/callback/1".into())));
        assert_eq!(link.amount, 30_000);
        assert_eq!(link.currency, "INR");
        assert_eq!(link.reference_id, "CK20240611-ABC123-1");
        assert_eq!(link.customer.email.as_deref(), Some("asha@example.com"));
        assert!(link.customer.contact.is_none());
        assert!(link.notify.email);
        assert!(!link.notify.sms);
        assert!(!link.accept_partial);
        assert_eq!(link.callback_url.as_deref(), Some("https://cakes.example.com/callback/1"));

        let link = new_payment_link_from_request(request(None));
        assert!(link.callback_url.is_none());
        assert!(link.callback_method.is_none());
    }

    #[test]
    fn only_server_side_failures_are_worth_retrying() {
        let e = gateway_error(PaymentLinkApiError::QueryError { status: 503, message: "down".into() });
        assert!(matches!(e, GatewayError::Unavailable(_)));
        let e = gateway_error(PaymentLinkApiError::QueryError { status: 400, message: "bad amount".into() });
        assert!(matches!(e, GatewayError::Rejected(_)));
        let e = gateway_error(PaymentLinkApiError::InvalidRequest("no contact".into()));
        assert!(matches!(e, GatewayError::Rejected(_)));
    }
}
