use super::engine::{merge_events, reconcile_local_meetings};
use super::models::{CalendarEvent, EventType, TypeFilter};
use super::selection::{select_event, EventDetail};
use super::window::{navigate, CalendarView, Navigation, VisibleWindow};
use crate::components::event_source::EventSource;
use crate::error::{component_error, CalendarResult};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Initial calendar state
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub timezone: Tz,
    pub view: CalendarView,
    pub anchor: NaiveDate,
    pub filter: TypeFilter,
}

impl CalendarSettings {
    /// Month view of today in `timezone` with the default filter
    pub fn new(timezone: Tz) -> Self {
        Self {
            anchor: Utc::now().with_timezone(&timezone).date_naive(),
            timezone,
            view: CalendarView::Month,
            filter: TypeFilter::default(),
        }
    }

    pub fn with_anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_view(mut self, view: CalendarView) -> Self {
        self.view = view;
        self
    }

    pub fn with_filter(mut self, filter: TypeFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Immutable view of the calendar handed out after every change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSnapshot {
    pub view: CalendarView,
    pub anchor: NaiveDate,
    pub window: VisibleWindow,
    pub filter: TypeFilter,
    /// Rendered events: server events, then local meetings, both filtered
    pub events: Vec<CalendarEvent>,
    /// True until the first successful load
    pub loading: bool,
    /// A fetch for the current window is in flight
    pub fetching: bool,
    pub last_error: Option<String>,
    pub selected: Option<EventDetail>,
    /// Number of committed fetches
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// User-visible message raised by the calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    Navigate(Navigation, mpsc::Sender<CalendarResult<VisibleWindow>>),
    SetFilter(TypeFilter, mpsc::Sender<()>),
    ToggleType(EventType, mpsc::Sender<bool>),
    AddLocalMeeting(CalendarEvent, mpsc::Sender<()>),
    Refresh(mpsc::Sender<()>),
    Select(String, mpsc::Sender<Option<EventDetail>>),
    ClearSelection(mpsc::Sender<()>),
    Snapshot(mpsc::Sender<CalendarSnapshot>),
    Shutdown,
}

/// Result of a fetch task, tagged with what it was fetched for
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub window: VisibleWindow,
    pub result: CalendarResult<Vec<CalendarEvent>>,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
}

impl CalendarActorHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(mpsc::Sender<T>) -> CalendarCommand,
    ) -> CalendarResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(make(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    /// Move the visible window
    pub async fn navigate(&self, step: Navigation) -> CalendarResult<VisibleWindow> {
        self.request(|tx| CalendarCommand::Navigate(step, tx)).await?
    }

    /// Replace the active type set
    pub async fn set_filter(&self, filter: TypeFilter) -> CalendarResult<()> {
        self.request(|tx| CalendarCommand::SetFilter(filter, tx)).await
    }

    /// Flip one type, returning whether it is now active
    pub async fn toggle_type(&self, event_type: EventType) -> CalendarResult<bool> {
        self.request(|tx| CalendarCommand::ToggleType(event_type, tx)).await
    }

    /// Add a meeting created in this session
    pub async fn add_local_meeting(&self, event: CalendarEvent) -> CalendarResult<()> {
        self.request(|tx| CalendarCommand::AddLocalMeeting(event, tx)).await
    }

    /// Fetch the current window again
    pub async fn refresh(&self) -> CalendarResult<()> {
        self.request(CalendarCommand::Refresh).await
    }

    /// Select a rendered event
    pub async fn select(&self, id: impl Into<String>) -> CalendarResult<Option<EventDetail>> {
        let id = id.into();
        self.request(|tx| CalendarCommand::Select(id, tx)).await
    }

    pub async fn clear_selection(&self) -> CalendarResult<()> {
        self.request(CalendarCommand::ClearSelection).await
    }

    /// Current state
    pub async fn snapshot(&self) -> CalendarResult<CalendarSnapshot> {
        self.request(CalendarCommand::Snapshot).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> CalendarResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }
}

/// The calendar actor: sole owner of view state, local meetings and the filter
pub struct CalendarActor {
    source: Arc<dyn EventSource>,
    timezone: Tz,
    command_rx: mpsc::Receiver<CalendarCommand>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    snapshot_tx: watch::Sender<CalendarSnapshot>,
    notification_tx: broadcast::Sender<Notification>,
    view: CalendarView,
    anchor: NaiveDate,
    window: VisibleWindow,
    filter: TypeFilter,
    server_events: Vec<CalendarEvent>,
    local_meetings: Vec<CalendarEvent>,
    selected: Option<String>,
    loading: bool,
    last_error: Option<String>,
    generation: u64,
    in_flight: Option<InFlight>,
    revision: u64,
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        source: Arc<dyn EventSource>,
        settings: CalendarSettings,
    ) -> CalendarResult<(Self, CalendarActorHandle)> {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (notification_tx, _) = broadcast::channel(16);

        let window = VisibleWindow::for_view(settings.view, settings.anchor, &settings.timezone)?;

        let initial = CalendarSnapshot {
            view: settings.view,
            anchor: settings.anchor,
            window,
            filter: settings.filter.clone(),
            events: Vec::new(),
            loading: true,
            fetching: false,
            last_error: None,
            selected: None,
            revision: 0,
        };
        let (snapshot_tx, _) = watch::channel(initial);

        let actor = Self {
            source,
            timezone: settings.timezone,
            command_rx,
            fetch_tx,
            fetch_rx,
            snapshot_tx,
            notification_tx,
            view: settings.view,
            anchor: settings.anchor,
            window,
            filter: settings.filter,
            server_events: Vec::new(),
            local_meetings: Vec::new(),
            selected: None,
            loading: true,
            last_error: None,
            generation: 0,
            in_flight: None,
            revision: 0,
        };

        Ok((actor, CalendarActorHandle { command_tx }))
    }

    /// Receiver for snapshots published by this actor
    pub fn subscribe(&self) -> watch::Receiver<CalendarSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn notification_sender(&self) -> broadcast::Sender<Notification> {
        self.notification_tx.clone()
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Calendar actor started");
        self.start_fetch();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(CalendarCommand::Shutdown) | None => {
                        info!("Calendar actor shutting down");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(outcome) = self.fetch_rx.recv() => self.handle_fetch_outcome(outcome),
            }
        }

        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
        info!("Calendar actor shut down");
    }

    async fn handle_command(&mut self, cmd: CalendarCommand) {
        match cmd {
            CalendarCommand::Navigate(step, response_tx) => {
                let result = self.navigate(step);
                if let Err(e) = &result {
                    error!("Navigation {:?} rejected: {}", step, e);
                }
                let _ = response_tx.send(result).await;
            }
            CalendarCommand::SetFilter(filter, response_tx) => {
                if filter != self.filter {
                    self.filter = filter;
                    self.start_fetch();
                }
                let _ = response_tx.send(()).await;
            }
            CalendarCommand::ToggleType(event_type, response_tx) => {
                let active = self.filter.toggle(event_type);
                info!("Event type {} {}", event_type, if active { "shown" } else { "hidden" });
                self.start_fetch();
                let _ = response_tx.send(active).await;
            }
            CalendarCommand::AddLocalMeeting(event, response_tx) => {
                info!("Adding local meeting {} ({})", event.id, event.title);
                let _ = self.notification_tx.send(Notification::info(
                    t!("notification_meeting_added", title = event.title.as_str()).to_string(),
                ));
                self.local_meetings.push(event);
                self.start_fetch();
                let _ = response_tx.send(()).await;
            }
            CalendarCommand::Refresh(response_tx) => {
                self.start_fetch();
                let _ = response_tx.send(()).await;
            }
            CalendarCommand::Select(id, response_tx) => {
                let events = self.rendered_events();
                let detail = select_event(&events, &id);
                self.selected = detail.as_ref().map(|d| d.event.id.clone());
                self.publish();
                let _ = response_tx.send(detail).await;
            }
            CalendarCommand::ClearSelection(response_tx) => {
                self.selected = None;
                self.publish();
                let _ = response_tx.send(()).await;
            }
            CalendarCommand::Snapshot(response_tx) => {
                let _ = response_tx.send(self.snapshot()).await;
            }
            CalendarCommand::Shutdown => {}
        }
    }

    fn navigate(&mut self, step: Navigation) -> CalendarResult<VisibleWindow> {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        let view = match step {
            Navigation::View(view) => view,
            _ => self.view,
        };
        let anchor = navigate(view, self.anchor, step, today)?;
        let window = VisibleWindow::for_view(view, anchor, &self.timezone)?;

        self.view = view;
        self.anchor = anchor;
        if window != self.window {
            debug!("Window moved to {} - {}", window.start, window.end);
            self.window = window;
            self.start_fetch();
        } else {
            self.publish();
        }

        Ok(window)
    }

    /// Fetch the current window, superseding any fetch still running
    fn start_fetch(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            debug!("Cancelling superseded fetch {}", previous.generation);
            previous.cancel.cancel();
        }
        self.generation += 1;

        if self.filter.is_empty() {
            // Nothing is active, and an empty type list would ask the server for everything.
            // Loading stays as it was until a real fetch succeeds.
            self.server_events.clear();
            self.publish();
            return;
        }

        let generation = self.generation;
        let window = self.window;
        let types = self.filter.to_vec();
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            generation,
            cancel: cancel.clone(),
        });

        let source = Arc::clone(&self.source);
        let fetch_tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Fetch {} cancelled", generation);
                }
                result = source.get_events(window.start, window.end, &types) => {
                    let _ = fetch_tx.send(FetchOutcome { generation, window, result });
                }
            }
        });

        self.publish();
    }

    /// Commit a fetch result if it still belongs to the current window
    pub fn handle_fetch_outcome(&mut self, outcome: FetchOutcome) {
        if outcome.generation != self.generation || outcome.window != self.window {
            debug!(
                "Discarding stale fetch {} (current {})",
                outcome.generation, self.generation
            );
            return;
        }
        self.in_flight = None;

        match outcome.result {
            Ok(events) => {
                let dropped = reconcile_local_meetings(&mut self.local_meetings, &events);
                if dropped > 0 {
                    info!("{} local meetings now returned by the server", dropped);
                }
                info!(
                    "Loaded {} events for {} - {}",
                    events.len(),
                    outcome.window.start,
                    outcome.window.end
                );
                self.server_events = events;
                self.loading = false;
                self.last_error = None;
                self.revision += 1;
            }
            Err(e) => {
                error!("Failed to fetch calendar events: {}", e);
                let message = t!("notification_fetch_failed", error = e.to_string()).to_string();
                self.last_error = Some(message.clone());
                let _ = self.notification_tx.send(Notification::error(message));
            }
        }

        self.publish();
    }

    fn rendered_events(&self) -> Vec<CalendarEvent> {
        merge_events(&self.server_events, &self.local_meetings, &self.filter)
    }

    /// Current state as an immutable snapshot
    pub fn snapshot(&self) -> CalendarSnapshot {
        let events = self.rendered_events();
        let selected = self
            .selected
            .as_deref()
            .and_then(|id| select_event(&events, id));

        CalendarSnapshot {
            view: self.view,
            anchor: self.anchor,
            window: self.window,
            filter: self.filter.clone(),
            events,
            loading: self.loading,
            fetching: self.in_flight.is_some(),
            last_error: self.last_error.clone(),
            selected,
            revision: self.revision,
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        // A selection that is no longer rendered is dropped
        if snapshot.selected.is_none() {
            self.selected = None;
        }
        self.snapshot_tx.send_replace(snapshot);
    }
}
