// Schedule service - Season event listings
use crate::application::session_provider::SessionProvider;
use crate::domain::event::Event;
use crate::error::ReplayError;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct ScheduleService {
    provider: Arc<dyn SessionProvider>,
    provider_timeout: Duration,
}

impl ScheduleService {
    pub fn new(provider: Arc<dyn SessionProvider>, provider_timeout: Duration) -> Self {
        Self {
            provider,
            provider_timeout,
        }
    }

    pub async fn events(&self, year: i32) -> Result<Vec<Event>, ReplayError> {
        self.bounded(self.provider.event_schedule(year)).await
    }

    pub async fn sprint_events(&self, year: i32) -> Result<Vec<Event>, ReplayError> {
        self.bounded(self.provider.sprint_schedule(year)).await
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ReplayError>>,
    ) -> Result<T, ReplayError> {
        tokio::time::timeout(self.provider_timeout, fut)
            .await
            .map_err(|_| ReplayError::ProviderTimeout(self.provider_timeout))?
    }
}
