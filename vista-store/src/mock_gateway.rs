use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use vista_core::payment::{PaymentRequest, PaymentSession, VerifiedPayment};
use vista_core::{GatewayError, PaymentGateway, PaymentStatus};

struct Transaction {
    amount: i64,
    currency: String,
    status: PaymentStatus,
}

/// In-process gateway for local runs and tests. Every transaction verifies as
/// successful unless an outcome was set with [`MockPaymentGateway::set_outcome`].
#[derive(Default)]
pub struct MockPaymentGateway {
    failing: AtomicBool,
    transactions: Mutex<HashMap<String, Transaction>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `initialize` fail as if the gateway were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn set_outcome(&self, reference: &str, status: PaymentStatus) {
        if let Some(tx) = self.transactions.lock().await.get_mut(reference) {
            tx.status = status;
        }
    }

    pub async fn initialized_count(&self) -> usize {
        self.transactions.lock().await.len()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    fn provider(&self) -> &'static str {
        "mock"
    }

    async fn initialize(&self, request: &PaymentRequest) -> Result<PaymentSession, GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("simulated gateway outage".into()));
        }

        let mut transactions = self.transactions.lock().await;
        if transactions.contains_key(&request.reference) {
            return Err(GatewayError::Rejected("Duplicate Transaction Reference".into()));
        }
        transactions.insert(
            request.reference.clone(),
            Transaction {
                amount: request.amount,
                currency: request.currency.clone(),
                status: PaymentStatus::Success,
            },
        );

        Ok(PaymentSession {
            authorization_url: format!("https://checkout.mock.local/{}", request.reference),
            access_code: Some(format!("mock_{}", request.reference.to_ascii_lowercase())),
            reference: request.reference.clone(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        let transactions = self.transactions.lock().await;
        let tx = transactions
            .get(reference)
            .ok_or_else(|| GatewayError::Rejected("Transaction reference not found".into()))?;

        Ok(VerifiedPayment {
            reference: reference.to_string(),
            status: tx.status,
            amount: tx.amount,
            currency: tx.currency.clone(),
        })
    }
}
