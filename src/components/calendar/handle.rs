use super::actor::{
    CalendarActor, CalendarActorHandle, CalendarSettings, CalendarSnapshot, Notification,
};
use super::models::{CalendarEvent, EventType, TypeFilter};
use super::selection::EventDetail;
use super::window::{Navigation, VisibleWindow};
use crate::components::event_source::EventSource;
use crate::components::meetings::MeetingReceiver;
use crate::error::{component_error, CalendarResult};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Handle for interacting with the calendar actor
#[derive(Clone)]
pub struct CalendarHandle {
    actor_handle: CalendarActorHandle,
    snapshot_rx: watch::Receiver<CalendarSnapshot>,
    notification_tx: broadcast::Sender<Notification>,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor. The first fetch starts immediately.
    pub fn new(source: Arc<dyn EventSource>, settings: CalendarSettings) -> CalendarResult<Self> {
        let (mut actor, handle) = CalendarActor::new(source, settings)?;
        let snapshot_rx = actor.subscribe();
        let notification_tx = actor.notification_sender();

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Ok(Self {
            actor_handle: handle,
            snapshot_rx,
            notification_tx,
            _actor_task: Arc::new(actor_task),
        })
    }

    pub async fn navigate(&self, step: Navigation) -> CalendarResult<VisibleWindow> {
        self.actor_handle.navigate(step).await
    }

    pub async fn set_filter(&self, filter: TypeFilter) -> CalendarResult<()> {
        self.actor_handle.set_filter(filter).await
    }

    pub async fn toggle_type(&self, event_type: EventType) -> CalendarResult<bool> {
        self.actor_handle.toggle_type(event_type).await
    }

    pub async fn add_local_meeting(&self, event: CalendarEvent) -> CalendarResult<()> {
        self.actor_handle.add_local_meeting(event).await
    }

    /// Add the meeting from a creation dialog once it exists
    pub fn track_meeting(&self, receiver: MeetingReceiver) -> JoinHandle<()> {
        let handle = self.actor_handle.clone();
        tokio::spawn(async move {
            match receiver.await {
                Ok(created) => match CalendarEvent::try_from(created) {
                    Ok(event) => {
                        if let Err(e) = handle.add_local_meeting(event).await {
                            error!("Failed to add created meeting: {}", e);
                        }
                    }
                    Err(e) => error!("Ignoring created meeting: {}", e),
                },
                Err(_) => debug!("Meeting dialog closed without creating a meeting"),
            }
        })
    }

    pub async fn refresh(&self) -> CalendarResult<()> {
        self.actor_handle.refresh().await
    }

    pub async fn select(&self, id: impl Into<String>) -> CalendarResult<Option<EventDetail>> {
        self.actor_handle.select(id).await
    }

    pub async fn clear_selection(&self) -> CalendarResult<()> {
        self.actor_handle.clear_selection().await
    }

    pub async fn snapshot(&self) -> CalendarResult<CalendarSnapshot> {
        self.actor_handle.snapshot().await
    }

    /// Receiver that sees every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<CalendarSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Receiver for user-visible notifications raised from now on
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notification_tx.subscribe()
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&CalendarSnapshot) -> bool,
    ) -> CalendarResult<CalendarSnapshot> {
        let mut snapshot_rx = self.snapshot_rx.clone();
        let snapshot = snapshot_rx
            .wait_for(predicate)
            .await
            .map_err(|_| component_error("Calendar actor stopped"))?;
        Ok((*snapshot).clone())
    }

    /// Wait until nothing is in flight for the current window
    pub async fn settled(&self) -> CalendarResult<CalendarSnapshot> {
        self.wait_for(|snapshot| !snapshot.fetching).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> CalendarResult<()> {
        self.actor_handle.shutdown().await
    }
}
