//! Payment gateway client
//!
//! PayMongo-style API: sources are created for redirect-based payment
//! methods, then charged with a payment once the customer authorizes.
//! All amounts cross this boundary as integer minor units (centavos).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult};

/// A payment source at the gateway (pre-authorization handle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSource {
    pub id: String,
    /// Gateway status: pending | chargeable | paid | expired
    pub status: String,
    /// Amount in minor units
    pub amount_minor: i64,
    pub currency: String,
    /// Customer-facing authorization URL
    pub checkout_url: Option<String>,
}

impl PaymentSource {
    /// Whether funds for this source are confirmed
    pub fn is_paid(&self) -> bool {
        self.status == "paid" || self.status == "chargeable"
    }
}

/// A committed payment at the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub status: String,
    pub amount_minor: i64,
}

/// Payment gateway contract
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a redirect payment source (e.g. gcash, grab_pay)
    async fn create_source(
        &self,
        amount_minor: i64,
        currency: &str,
        kind: &str,
        success_url: &str,
        failed_url: &str,
    ) -> AppResult<PaymentSource>;

    /// Fetch the current state of a source
    async fn get_source(&self, source_id: &str) -> AppResult<PaymentSource>;

    /// Charge a chargeable source
    async fn create_payment(
        &self,
        amount_minor: i64,
        currency: &str,
        source_id: &str,
        description: &str,
    ) -> AppResult<PaymentRecord>;
}

// ===== Wire format (data.attributes envelope) =====

#[derive(Serialize)]
struct Envelope<T> {
    data: DataNode<T>,
}

#[derive(Serialize)]
struct DataNode<T> {
    attributes: T,
}

#[derive(Deserialize)]
struct ResponseEnvelope<T> {
    data: ResponseNode<T>,
}

#[derive(Deserialize)]
struct ResponseNode<T> {
    id: String,
    attributes: T,
}

#[derive(Serialize)]
struct SourceRequest {
    amount: i64,
    currency: String,
    #[serde(rename = "type")]
    kind: String,
    redirect: RedirectUrls,
}

#[derive(Serialize)]
struct RedirectUrls {
    success: String,
    failed: String,
}

#[derive(Deserialize)]
struct SourceAttributes {
    status: String,
    amount: i64,
    currency: String,
    redirect: Option<RedirectAttributes>,
}

#[derive(Deserialize)]
struct RedirectAttributes {
    checkout_url: Option<String>,
}

#[derive(Serialize)]
struct PaymentRequest {
    amount: i64,
    currency: String,
    description: String,
    source: PaymentSourceRef,
}

#[derive(Serialize)]
struct PaymentSourceRef {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct PaymentAttributes {
    status: String,
    amount: i64,
}

/// HTTP PayMongo client
#[derive(Clone)]
pub struct PayMongoClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PayMongoClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> AppResult<ResponseEnvelope<T>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Payment gateway rejected request");
            return Err(AppError::upstream(
                "paymongo",
                format!("Gateway returned {status}"),
            ));
        }
        response
            .json::<ResponseEnvelope<T>>()
            .await
            .map_err(|e| AppError::upstream("paymongo", format!("Malformed gateway response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for PayMongoClient {
    async fn create_source(
        &self,
        amount_minor: i64,
        currency: &str,
        kind: &str,
        success_url: &str,
        failed_url: &str,
    ) -> AppResult<PaymentSource> {
        let body = Envelope {
            data: DataNode {
                attributes: SourceRequest {
                    amount: amount_minor,
                    currency: currency.to_string(),
                    kind: kind.to_string(),
                    redirect: RedirectUrls {
                        success: success_url.to_string(),
                        failed: failed_url.to_string(),
                    },
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/sources", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::upstream("paymongo", format!("Request failed: {e}")))?;

        let envelope: ResponseEnvelope<SourceAttributes> = Self::parse(response).await?;
        Ok(PaymentSource {
            id: envelope.data.id,
            status: envelope.data.attributes.status,
            amount_minor: envelope.data.attributes.amount,
            currency: envelope.data.attributes.currency,
            checkout_url: envelope
                .data
                .attributes
                .redirect
                .and_then(|r| r.checkout_url),
        })
    }

    async fn get_source(&self, source_id: &str) -> AppResult<PaymentSource> {
        let response = self
            .client
            .get(format!("{}/sources/{}", self.base_url, source_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::upstream("paymongo", format!("Request failed: {e}")))?;

        let envelope: ResponseEnvelope<SourceAttributes> = Self::parse(response).await?;
        Ok(PaymentSource {
            id: envelope.data.id,
            status: envelope.data.attributes.status,
            amount_minor: envelope.data.attributes.amount,
            currency: envelope.data.attributes.currency,
            checkout_url: envelope
                .data
                .attributes
                .redirect
                .and_then(|r| r.checkout_url),
        })
    }

    async fn create_payment(
        &self,
        amount_minor: i64,
        currency: &str,
        source_id: &str,
        description: &str,
    ) -> AppResult<PaymentRecord> {
        let body = Envelope {
            data: DataNode {
                attributes: PaymentRequest {
                    amount: amount_minor,
                    currency: currency.to_string(),
                    description: description.to_string(),
                    source: PaymentSourceRef {
                        id: source_id.to_string(),
                        kind: "source".to_string(),
                    },
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::upstream("paymongo", format!("Request failed: {e}")))?;

        let envelope: ResponseEnvelope<PaymentAttributes> = Self::parse(response).await?;
        Ok(PaymentRecord {
            id: envelope.data.id,
            status: envelope.data.attributes.status,
            amount_minor: envelope.data.attributes.amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_paid_states() {
        let mut source = PaymentSource {
            id: "src_1".into(),
            status: "pending".into(),
            amount_minor: 49800,
            currency: "PHP".into(),
            checkout_url: None,
        };
        assert!(!source.is_paid());
        source.status = "chargeable".into();
        assert!(source.is_paid());
        source.status = "paid".into();
        assert!(source.is_paid());
    }

    #[test]
    fn test_response_envelope_deserialization() {
        let json = r#"{
            "data": {
                "id": "src_abc",
                "attributes": {
                    "status": "chargeable",
                    "amount": 49800,
                    "currency": "PHP",
                    "redirect": { "checkout_url": "https://gateway.test/checkout" }
                }
            }
        }"#;
        let envelope: ResponseEnvelope<SourceAttributes> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.id, "src_abc");
        assert_eq!(envelope.data.attributes.amount, 49800);
        assert_eq!(
            envelope.data.attributes.redirect.unwrap().checkout_url,
            Some("https://gateway.test/checkout".to_string())
        );
    }
}
