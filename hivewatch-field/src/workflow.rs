//! Submission workflow state machine
//!
//! One draft at a time moves Idle -> Verifying -> {Verified |
//! Rejected} -> Stored. A verified draft auto-stores when the
//! countdown fires; the user may confirm earlier or discard and start
//! over with a fresh draft. Auto-fire and manual confirm can never
//! both store: the countdown is cancelled on every exit transition.

use hivewatch_common::api::{ImageOrigin, VerifyResponse};
use hivewatch_common::guidance;
use hivewatch_common::models::{Gps, LocationType, Report, UserRole};
use hivewatch_common::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::capture::ImageSource;
use crate::client::ReportGateway;
use crate::countdown::{Countdown, CountdownEvent};

/// Auto-store delay after a positive verification
pub const AUTO_STORE_DELAY_SECS: u64 = 60;

/// Client-side submission payload. Accumulated incrementally, then
/// validated atomically before verification starts; never partially
/// sent.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub image: Option<ImageSource>,
    pub gps: Gps,
    pub location_type: Option<LocationType>,
    pub user_role: UserRole,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl SubmissionDraft {
    pub fn new(gps: Gps) -> Self {
        SubmissionDraft {
            image: None,
            gps,
            location_type: None,
            user_role: UserRole::GeneralPublic,
            address: None,
            phone_number: None,
        }
    }

    /// Local validation before any network call
    pub fn validate(&self) -> Result<()> {
        if self.image.is_none() {
            return Err(hivewatch_common::Error::Validation(
                "An image is required before submitting".to_string(),
            ));
        }
        if self.location_type.is_none() {
            return Err(hivewatch_common::Error::Validation(
                "Select where the colony was found".to_string(),
            ));
        }
        Ok(())
    }

    pub fn origin(&self) -> ImageOrigin {
        match self.image {
            Some(ImageSource::Frame(_)) => ImageOrigin::Camera,
            _ => ImageOrigin::Upload,
        }
    }

    /// First address component, used for city-based contact matching
    pub fn city_hint(&self) -> Option<String> {
        self.address
            .as_ref()
            .and_then(|a| a.split(',').next())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

/// Workflow states, in transition order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Verifying,
    Verified,
    Rejected,
    Stored,
}

/// User actions while a verified draft is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Store now instead of waiting out the countdown
    Confirm,
    /// Abandon the draft and return to Idle
    Discard,
}

/// Progress events for whatever UI is driving the workflow
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StateChanged(SubmissionState),
    /// Verification verdict, positive or negative, with rationale
    Verdict(VerifyResponse),
    /// Seconds remaining before auto-store
    CountdownTick(u64),
    /// Regional emergency contact, fetched alongside verification
    ContactAvailable(hivewatch_common::models::EmergencyContact),
    /// Safety do/don't lists for this sighting
    Guidance(guidance::SafetyGuidance),
    /// Persistence failed; the verified draft is retained for retry
    StorageFailed(String),
    Stored(Report),
}

pub struct SubmissionWorkflow<G> {
    gateway: Arc<G>,
    confirm_delay_secs: u64,
}

impl<G: ReportGateway + 'static> SubmissionWorkflow<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        SubmissionWorkflow {
            gateway,
            confirm_delay_secs: AUTO_STORE_DELAY_SECS,
        }
    }

    pub fn with_confirm_delay(mut self, seconds: u64) -> Self {
        self.confirm_delay_secs = seconds;
        self
    }

    /// Drive one submission to a terminal state.
    ///
    /// Returns the stored report, or None when the draft was rejected
    /// or discarded. Verification and network failures are returned
    /// as errors after the Rejected transition; nothing is retried
    /// automatically.
    pub async fn run(
        &self,
        draft: SubmissionDraft,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::Sender<WorkflowEvent>,
    ) -> Result<Option<Report>> {
        draft.validate()?;
        emit(&events, WorkflowEvent::StateChanged(SubmissionState::Verifying)).await;

        // Contact lookup runs in parallel with verification, off the
        // critical path; the result lands as an event whenever it
        // arrives.
        {
            let gateway = self.gateway.clone();
            let events = events.clone();
            let gps = draft.gps;
            let city = draft.city_hint();
            tokio::spawn(async move {
                match gateway.emergency_contact(&gps, city.as_deref()).await {
                    Ok(contact) => emit(&events, WorkflowEvent::ContactAvailable(contact)).await,
                    Err(e) => warn!("Emergency contact lookup failed: {}", e),
                }
            });
        }

        let verdict = match self.gateway.verify(&draft).await {
            Ok(verdict) => verdict,
            Err(e) => {
                emit(&events, WorkflowEvent::StateChanged(SubmissionState::Rejected)).await;
                return Err(e);
            }
        };
        emit(&events, WorkflowEvent::Verdict(verdict.clone())).await;

        if !verdict.is_honeybee {
            info!(confidence = verdict.confidence, "submission rejected");
            emit(&events, WorkflowEvent::StateChanged(SubmissionState::Rejected)).await;
            return Ok(None);
        }

        emit(&events, WorkflowEvent::StateChanged(SubmissionState::Verified)).await;
        if let Some(location) = draft.location_type {
            let advice = guidance::for_sighting(location, draft.user_role);
            emit(&events, WorkflowEvent::Guidance(advice)).await;
        }

        let mut countdown = Some(Countdown::start(self.confirm_delay_secs));
        let mut commands_open = true;

        loop {
            tokio::select! {
                event = next_countdown_event(&mut countdown) => match event {
                    Some(CountdownEvent::Tick(remaining)) => {
                        emit(&events, WorkflowEvent::CountdownTick(remaining)).await;
                    }
                    Some(CountdownEvent::Fire) => {
                        countdown = None;
                        if let Some(report) = self.try_store(&draft, &events).await {
                            return Ok(Some(report));
                        }
                        if !commands_open {
                            // Nobody left to retry the store
                            return Err(hivewatch_common::Error::Storage(
                                "Report could not be stored".to_string(),
                            ));
                        }
                    }
                    None => countdown = None,
                },
                command = commands.recv(), if commands_open => match command {
                    Some(Command::Confirm) => {
                        if let Some(active) = countdown.take() {
                            active.cancel();
                        }
                        if let Some(report) = self.try_store(&draft, &events).await {
                            return Ok(Some(report));
                        }
                    }
                    Some(Command::Discard) => {
                        if let Some(active) = countdown.take() {
                            active.cancel();
                        }
                        info!("submission discarded");
                        emit(&events, WorkflowEvent::StateChanged(SubmissionState::Idle)).await;
                        return Ok(None);
                    }
                    None => {
                        commands_open = false;
                        if countdown.is_none() {
                            // Auto-store already failed and no command
                            // source remains to retry it
                            return Err(hivewatch_common::Error::Storage(
                                "Report could not be stored".to_string(),
                            ));
                        }
                    }
                },
            }
        }
    }

    /// One storage attempt. On failure the workflow stays Verified
    /// with the verdict retained so the user can retry storing
    /// without re-verifying.
    async fn try_store(
        &self,
        draft: &SubmissionDraft,
        events: &mpsc::Sender<WorkflowEvent>,
    ) -> Option<Report> {
        match self.gateway.store(draft).await {
            Ok(report) => {
                info!(id = %report.id, "report stored");
                emit(events, WorkflowEvent::Stored(report.clone())).await;
                emit(events, WorkflowEvent::StateChanged(SubmissionState::Stored)).await;
                Some(report)
            }
            Err(e) => {
                warn!("Storing report failed: {}", e);
                emit(events, WorkflowEvent::StorageFailed(e.to_string())).await;
                None
            }
        }
    }
}

async fn next_countdown_event(countdown: &mut Option<Countdown>) -> Option<CountdownEvent> {
    match countdown {
        Some(active) => active.next().await,
        None => std::future::pending().await,
    }
}

async fn emit(events: &mpsc::Sender<WorkflowEvent>, event: WorkflowEvent) {
    // A detached UI is not a reason to stall the workflow
    let _ = events.send(event).await;
}
