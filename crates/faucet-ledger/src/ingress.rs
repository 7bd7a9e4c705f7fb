//! Request ingress: verify a caller and record their fund request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, info_span, warn, Instrument, Span};

use faucet_ledger_core::{Address, FundRequest, RequestId};
use faucet_ledger_store::Ledger;

use crate::error::{FaucetError, Result};

/// Per-request metadata carried into logs and handed to the verifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub remote_ip: String,
    pub user_agent: String,
}

impl RequestContext {
    pub fn new(remote_ip: impl Into<String>) -> Self {
        Self {
            remote_ip: remote_ip.into(),
            ..Self::default()
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The span every log line for this request is emitted under.
    pub fn span(&self) -> Span {
        info_span!(
            "fund_request",
            request_id = %self.request_id,
            remote_ip = %self.remote_ip,
            user_agent = %self.user_agent
        )
    }
}

/// Decides whether a caller may receive funds, e.g. by checking a CAPTCHA
/// token.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Succeeds if the caller is allowed. The error message is passed back to
    /// the caller unchanged.
    async fn verify(
        &self,
        ctx: &RequestContext,
        token: &str,
        remote_ip: &str,
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl<V: Verifier + ?Sized> Verifier for Arc<V> {
    async fn verify(
        &self,
        ctx: &RequestContext,
        token: &str,
        remote_ip: &str,
    ) -> anyhow::Result<()> {
        (**self).verify(ctx, token, remote_ip).await
    }
}

/// Accepts fund requests into a ledger.
pub struct Ingress<L: ?Sized, V> {
    ledger: Arc<L>,
    verifier: V,
}

impl<L, V> Ingress<L, V>
where
    L: Ledger + ?Sized,
    V: Verifier,
{
    pub fn new(ledger: Arc<L>, verifier: V) -> Self {
        Self { ledger, verifier }
    }

    /// Validate, verify, and insert a new pending request for `address`.
    ///
    /// Returns the new request's id. Errors from the address or the verifier
    /// are client errors; see [`FaucetError::is_client_error`].
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        address: &str,
        token: &str,
    ) -> Result<RequestId> {
        self.accept(ctx, address, token).instrument(ctx.span()).await
    }

    async fn accept(&self, ctx: &RequestContext, address: &str, token: &str) -> Result<RequestId> {
        let address = Address::new(address).map_err(|e| {
            warn!(error = %e, "rejected malformed request");
            FaucetError::Validation(e)
        })?;

        if let Err(e) = self.verifier.verify(ctx, token, &ctx.remote_ip).await {
            warn!(error = %e, "verification failed");
            return Err(FaucetError::Rejected(e.to_string()));
        }

        let request = FundRequest::fresh(address);
        let id = request.id().clone();

        self.ledger.insert(request).await.map_err(|e| {
            error!(%id, error = %e, "insert failed");
            FaucetError::Store(e)
        })?;

        info!(%id, "fund request accepted");
        Ok(id)
    }
}
