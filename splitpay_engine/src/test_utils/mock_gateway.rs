use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use log::*;

use crate::traits::{GatewayError, IssuedPaymentLink, PaymentLinkGateway, PaymentLinkRequest};

#[derive(Debug, Default)]
struct GatewayState {
    requests: Vec<PaymentLinkRequest>,
    failing_payers: HashSet<String>,
    calls: usize,
}

/// An in-memory payment link gateway. Links are numbered `plink_0001`, `plink_0002`, etc. in the order they are
/// issued. Issuance can be made to fail for particular payers (matched by name or email) to simulate a gateway
/// outage.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every link request for this payer fails until [`Self::recover_for`] is called.
    pub fn fail_for(&self, payer: &str) {
        self.state.lock().unwrap().failing_payers.insert(payer.to_string());
    }

    pub fn recover_for(&self, payer: &str) {
        self.state.lock().unwrap().failing_payers.remove(payer);
    }

    /// The number of times the gateway was called, including failed calls.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// The requests for which a link was issued, in order.
    pub fn issued(&self) -> Vec<PaymentLinkRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl PaymentLinkGateway for MockGateway {
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<IssuedPaymentLink, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let payer = &request.payer;
        let fails = state.failing_payers.contains(&payer.name) ||
            payer.email.as_ref().map(|e| state.failing_payers.contains(e)).unwrap_or(false);
        if fails {
            debug!("🧪️ Simulating a gateway failure for {}", payer.name);
            return Err(GatewayError::Unavailable("Simulated gateway outage".into()));
        }
        state.requests.push(request);
        let id = format!("plink_{:04}", state.requests.len());
        let short_url = format!("https://pay.example.com/{id}");
        Ok(IssuedPaymentLink { id, short_url })
    }
}
