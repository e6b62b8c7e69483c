use crate::components::calendar::agenda::{format_agenda, format_event_line, new_events};
use crate::components::calendar::{
    CalendarHandle, CalendarSettings, CalendarSnapshot, Notification, NotificationLevel,
};
use crate::components::event_source::HttpEventSource;
use crate::config::Config;
use crate::error::{CalendarResult, Error};
use crate::shutdown;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub async fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Print the agenda for the current month, then keep refreshing until a shutdown signal
pub async fn run(config: Config) -> miette::Result<()> {
    crate::utils::i18n::set_locale(&config.locale);
    info!("Setting locale to {}", config.locale);

    let timezone = config.timezone()?;
    let source = Arc::new(HttpEventSource::new(&config)?);
    let settings = CalendarSettings::new(timezone).with_filter(config.initial_filter());
    let calendar = CalendarHandle::new(source, settings)?;
    let mut notifications = calendar.notifications();

    let snapshot = calendar
        .wait_for(|snapshot| {
            !snapshot.loading || snapshot.last_error.is_some() || snapshot.filter.is_empty()
        })
        .await?;
    if let Some(message) = &snapshot.last_error {
        eprintln!("{}", message);
    }
    println!("{}", format_agenda(&snapshot, &timezone));

    if config.refresh_interval_secs == 0 {
        calendar.shutdown().await?;
        return Ok(());
    }

    info!("Refreshing every {} seconds", config.refresh_interval_secs);
    let mut seen = event_ids(&snapshot);
    let mut interval = tokio::time::interval(Duration::from_secs(config.refresh_interval_secs));
    // The first tick completes immediately
    interval.tick().await;

    let shutdown = shutdown::wait_for_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Signal handling failed: {}", e);
                }
                break;
            }
            _ = interval.tick() => {
                match refresh(&calendar, &mut seen, &timezone).await {
                    Ok(count) if count > 0 => info!("{} new events", count),
                    Ok(_) => {}
                    Err(e) => error!("Refresh failed: {}", e),
                }
            }
            notification = notifications.recv() => log_notification(notification),
        }
    }

    calendar.shutdown().await?;
    info!("Calendar shut down");
    Ok(())
}

/// Refresh the current window and print events not seen before
async fn refresh(
    calendar: &CalendarHandle,
    seen: &mut HashSet<String>,
    timezone: &chrono_tz::Tz,
) -> CalendarResult<usize> {
    calendar.refresh().await?;
    let snapshot = calendar.settled().await?;

    let fresh = new_events(seen, &snapshot.events);
    if !fresh.is_empty() {
        println!("{}", t!("agenda_new_events"));
        for event in &fresh {
            println!("{}", format_event_line(event, timezone));
        }
    }

    let count = fresh.len();
    seen.extend(event_ids(&snapshot));
    Ok(count)
}

fn event_ids(snapshot: &CalendarSnapshot) -> HashSet<String> {
    snapshot.events.iter().map(|event| event.id.clone()).collect()
}

fn log_notification(notification: Result<Notification, broadcast::error::RecvError>) {
    match notification {
        Ok(notification) => match notification.level {
            NotificationLevel::Info => info!("{}", notification.message),
            NotificationLevel::Error => warn!("{}", notification.message),
        },
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            warn!("Skipped {} notifications", skipped)
        }
        Err(broadcast::error::RecvError::Closed) => {}
    }
}
