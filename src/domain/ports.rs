use crate::domain::model::ChannelStatus;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Outbound boundary to the service that knows whether a number has a chat channel.
#[async_trait]
pub trait ChannelVerifier: Send + Sync {
    async fn verify(&self, e164: &str) -> Result<ChannelStatus>;
}

pub trait CheckerSettings: Send + Sync {
    fn debounce(&self) -> Duration;
    fn min_digits(&self) -> usize;
    fn timeout(&self) -> Duration;
}
