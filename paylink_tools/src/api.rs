use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PaymentLinkConfig,
    data_objects::{NewPaymentLink, PaymentLink},
    PaymentLinkApiError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct PaymentLinkApi {
    config: PaymentLinkConfig,
    client: Arc<Client>,
}

impl PaymentLinkApi {
    pub fn new(config: PaymentLinkConfig) -> Result<Self, PaymentLinkApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaymentLinkApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaymentLinkApiError> {
        let url = self.url(path);
        trace!("🔗️ Sending REST query: {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PaymentLinkApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🔗️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PaymentLinkApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message =
                response.text().await.map_err(|e| PaymentLinkApiError::RestResponseError(e.to_string()))?;
            Err(PaymentLinkApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Ask the gateway to issue a new hosted payment link.
    pub async fn create_payment_link(&self, link: NewPaymentLink) -> Result<PaymentLink, PaymentLinkApiError> {
        if link.amount <= 0 {
            return Err(PaymentLinkApiError::InvalidRequest(format!("Amount must be positive, not {}", link.amount)));
        }
        if link.customer.email.is_none() && link.customer.contact.is_none() {
            return Err(PaymentLinkApiError::InvalidRequest("The payer needs an email or phone number".into()));
        }
        debug!("🔗️ Creating payment link for {} ({} minor units)", link.reference_id, link.amount);
        let result = self.rest_query::<PaymentLink, _>(Method::POST, "/payment_links", Some(link)).await?;
        info!("🔗️ Payment link {} issued: {}", result.id, result.short_url);
        Ok(result)
    }

    pub async fn fetch_payment_link(&self, link_id: &str) -> Result<PaymentLink, PaymentLinkApiError> {
        let path = format!("/payment_links/{link_id}");
        debug!("🔗️ Fetching payment link {link_id}");
        self.rest_query::<PaymentLink, ()>(Method::GET, &path, None).await
    }

    pub async fn cancel_payment_link(&self, link_id: &str) -> Result<PaymentLink, PaymentLinkApiError> {
        let path = format!("/payment_links/{link_id}/cancel");
        debug!("🔗️ Cancelling payment link {link_id}");
        let result = self.rest_query::<PaymentLink, ()>(Method::POST, &path, None).await?;
        info!("🔗️ Payment link {link_id} is now {}", result.status);
        Ok(result)
    }

    pub fn config(&self) -> &PaymentLinkConfig {
        &self.config
    }
}
