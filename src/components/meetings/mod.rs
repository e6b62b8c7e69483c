pub mod flow;
mod google;
pub mod models;
pub mod provider;
mod teams;
pub mod token;

pub use flow::{FlowState, MeetingFlow, MeetingForm, MeetingReceiver};
pub use google::{GoogleMeetProvider, GOOGLE_CALENDAR_API};
pub use models::{CreatedMeeting, MeetingDetails, MeetingRequest, Provider};
pub use provider::{MeetingProvider, MeetingProviderAdapter};
pub use teams::{TeamsMeetingProvider, GRAPH_API};

use crate::config::Config;
use std::sync::Arc;

/// Adapter with the Google and Teams providers from configuration.
///
/// Providers without credentials stay registered and report themselves as not configured.
pub fn adapter_from_config(config: &Config) -> MeetingProviderAdapter {
    MeetingProviderAdapter::new()
        .with_provider(Arc::new(GoogleMeetProvider::new(
            config.google.as_ref(),
            config.oauth_redirect_port,
        )))
        .with_provider(Arc::new(TeamsMeetingProvider::new(
            config.teams.as_ref(),
            config.oauth_redirect_port,
        )))
}
