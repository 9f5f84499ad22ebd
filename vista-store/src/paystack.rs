//! Paystack transaction API client and webhook signature check.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha512;
use std::time::Duration;
use tracing::{debug, warn};
use vista_core::payment::{PaymentRequest, PaymentSession, VerifiedPayment};
use vista_core::{GatewayError, PaymentGateway, PaymentStatus};

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

type HmacSha512 = Hmac<Sha512>;

#[derive(Clone)]
pub struct PaystackGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

/// Every Paystack response is wrapped in `{ status, message, data }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: Option<String>,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    reference: String,
    amount: i64,
    currency: String,
}

impl PaystackGateway {
    pub fn new(base_url: &str, secret_key: &str) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn read<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(GatewayError::Rejected(format!("{status}: {body}"))),
            Err(e) => return Err(GatewayError::InvalidResponse(e.to_string())),
        };

        if !status.is_success() || !envelope.status {
            return Err(GatewayError::Rejected(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse(format!("no data in response: {}", envelope.message)))
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn provider(&self) -> &'static str {
        "paystack"
    }

    async fn initialize(&self, request: &PaymentRequest) -> Result<PaymentSession, GatewayError> {
        let mut body = json!({
            "email": request.email,
            "amount": request.amount,
            "currency": request.currency,
            "reference": request.reference,
            "metadata": request.metadata,
        });
        if let Some(url) = &request.callback_url {
            body["callback_url"] = json!(url);
        }

        let resp = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let data: InitializeData = Self::read(resp).await?;
        debug!(reference = %data.reference, "paystack transaction initialized");

        Ok(PaymentSession {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        let resp = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let data: VerifyData = Self::read(resp).await?;
        if data.reference != reference {
            warn!(expected = reference, got = %data.reference, "paystack verify returned another reference");
            return Err(GatewayError::InvalidResponse("reference mismatch".into()));
        }

        Ok(VerifiedPayment {
            reference: data.reference,
            status: PaymentStatus::from_gateway(&data.status),
            amount: data.amount,
            currency: data.currency,
        })
    }
}

/// Hex HMAC-SHA512 of `payload` under `secret`, as Paystack sends it in [`SIGNATURE_HEADER`].
pub fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a webhook signature.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Some(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PaymentRequest {
        PaymentRequest {
            email: "ada@example.com".to_string(),
            amount: 540_000,
            currency: "NGN".to_string(),
            reference: "VST-ABCDE12345".to_string(),
            callback_url: Some("https://vista.test/callback".to_string()),
            metadata: json!({ "listing_type": "event" }),
        }
    }

    #[tokio::test]
    async fn test_initialize_sends_booking_and_reads_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_partial_json(json!({
                "email": "ada@example.com",
                "amount": 540000,
                "reference": "VST-ABCDE12345",
                "callback_url": "https://vista.test/callback"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
                    "access_code": "0peioxfhpn",
                    "reference": "VST-ABCDE12345"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = PaystackGateway::new(&server.uri(), "sk_test_123").unwrap();
        let session = gateway.initialize(&request()).await.unwrap();

        assert_eq!(session.authorization_url, "https://checkout.paystack.com/0peioxfhpn");
        assert_eq!(session.access_code.as_deref(), Some("0peioxfhpn"));
        assert_eq!(session.reference, "VST-ABCDE12345");
    }

    #[tokio::test]
    async fn test_initialize_rejection_carries_gateway_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "message": "Duplicate Transaction Reference"
            })))
            .mount(&server)
            .await;

        let gateway = PaystackGateway::new(&server.uri(), "sk_test_123").unwrap();
        let err = gateway.initialize(&request()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Rejected(msg) if msg == "Duplicate Transaction Reference"));
    }

    #[tokio::test]
    async fn test_verify_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/VST-ABCDE12345"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "status": "abandoned",
                    "reference": "VST-ABCDE12345",
                    "amount": 540000,
                    "currency": "NGN"
                }
            })))
            .mount(&server)
            .await;

        let gateway = PaystackGateway::new(&format!("{}/", server.uri()), "sk_test_123").unwrap();
        let verified = gateway.verify("VST-ABCDE12345").await.unwrap();

        assert_eq!(verified.status, PaymentStatus::Abandoned);
        assert_eq!(verified.amount, 540_000);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        let gateway = PaystackGateway::new("http://127.0.0.1:1", "sk_test_123").unwrap();
        assert!(matches!(
            gateway.initialize(&request()).await,
            Err(GatewayError::Transport(_))
        ));
    }

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"event":"charge.success","data":{"reference":"VST-ABCDE12345"}}"#;
        let sig = sign("sk_test_123", body);

        assert_eq!(sig.len(), 128);
        assert!(verify_signature("sk_test_123", body, &sig));
        assert!(verify_signature("sk_test_123", body, &sig.to_uppercase()));
        assert!(!verify_signature("sk_test_other", body, &sig));
        assert!(!verify_signature("sk_test_123", b"{}", &sig));
        assert!(!verify_signature("sk_test_123", body, "not-hex"));
        assert!(!verify_signature("sk_test_123", body, ""));
    }
}
