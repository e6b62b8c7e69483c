use super::models::{MeetingDetails, MeetingRequest, Provider};
use crate::error::{CalendarResult, Error};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// A meeting-hosting service behind its SDK or REST API.
///
/// Capability queries are answered from local state and never touch the network.
#[async_trait]
pub trait MeetingProvider: Send + Sync {
    fn provider(&self) -> Provider;

    fn is_configured(&self) -> bool;

    fn is_signed_in(&self) -> bool;

    async fn sign_in(&self) -> CalendarResult<()>;

    async fn create_meeting(&self, request: &MeetingRequest) -> CalendarResult<MeetingDetails>;
}

/// Uniform entry point over every registered provider
#[derive(Clone, Default)]
pub struct MeetingProviderAdapter {
    providers: HashMap<Provider, Arc<dyn MeetingProvider>>,
}

impl fmt::Debug for MeetingProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeetingProviderAdapter")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MeetingProviderAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any earlier one with the same tag
    pub fn register(&mut self, provider: Arc<dyn MeetingProvider>) {
        info!("Registering meeting provider: {}", provider.provider());
        self.providers.insert(provider.provider(), provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn MeetingProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Unregistered providers count as not configured
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.providers
            .get(&provider)
            .is_some_and(|p| p.is_configured())
    }

    pub fn is_signed_in(&self, provider: Provider) -> bool {
        self.providers
            .get(&provider)
            .is_some_and(|p| p.is_configured() && p.is_signed_in())
    }

    pub async fn sign_in(&self, provider: Provider) -> CalendarResult<()> {
        let backend = self.configured(provider)?;
        backend.sign_in().await
    }

    /// Create a meeting. Rejects up front when the provider is not configured or not signed in.
    pub async fn create_meeting(
        &self,
        provider: Provider,
        request: &MeetingRequest,
    ) -> CalendarResult<MeetingDetails> {
        let backend = self.configured(provider)?;
        if !backend.is_signed_in() {
            return Err(Error::ProviderNotSignedIn(provider));
        }

        match backend.create_meeting(request).await {
            Ok(details) => {
                info!("Created {} meeting {} ({})", provider, details.id, details.title);
                Ok(details)
            }
            Err(e) => {
                warn!("Failed to create {} meeting: {}", provider, e);
                Err(e)
            }
        }
    }

    fn configured(&self, provider: Provider) -> CalendarResult<&Arc<dyn MeetingProvider>> {
        self.providers
            .get(&provider)
            .filter(|p| p.is_configured())
            .ok_or(Error::ProviderNotConfigured(provider))
    }
}
