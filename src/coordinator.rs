// Completion Coordinator - optimistic step completion with fire-and-forget
// remote writes
//
// The shipment service stays the source of truth: local patches are applied
// immediately and never rolled back, and the next refresh reconciles them.

use crate::config::CoordinatorConfig;
use crate::service::{RetryHandler, ServiceError, ShipmentRecord, ShipmentService, ShipmentUpdate};
use crate::shipment::{RefreshOutcome, Shipment, ShipmentBoard, ShipmentId};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflows::{
    derive_all, derive_status, next_step, DisplayStatus, GuardPhase, NextStep, ReentrancyGuard,
    Step, StepStatuses,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, Instrument};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Shipment not found: {0}")]
    ShipmentNotFound(ShipmentId),
    #[error("{step} does not accept operator notes")]
    CommentNotAllowed { step: Step },
    #[error("A note is required to mark {step} incomplete")]
    EmptyNote { step: Step },
    #[error("{step} is the last step and cannot be skipped")]
    CannotSkipFinalStep { step: Step },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Flag set to true
    Confirm,
    /// Pointer advanced without touching the flag
    Skip,
    /// Flag forced to false with an operator note
    MarkIncomplete,
}

impl CompletionKind {
    fn operation_name(self) -> &'static str {
        match self {
            CompletionKind::Confirm => "confirm_step",
            CompletionKind::Skip => "skip_step",
            CompletionKind::MarkIncomplete => "mark_incomplete_with_note",
        }
    }
}

/// Where the operator goes after a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    /// Back to the shipment list. The just-completed row stays suppressed
    /// until the cooldown ends.
    ReturnToList { refresh: bool },
}

/// The dispatched remote write. Await it to observe the result, or drop it.
pub type WriteHandle = JoinHandle<Result<(), ServiceError>>;

#[derive(Debug)]
pub struct AcceptedCompletion {
    pub shipment_id: ShipmentId,
    pub step: Step,
    pub kind: CompletionKind,
    /// Display status of `step` after the optimistic patch
    pub status: DisplayStatus,
    pub next: NextStep,
    pub navigation: Navigation,
    pub correlation_id: String,
    pub write: WriteHandle,
}

#[derive(Debug)]
pub enum CompletionOutcome {
    Accepted(AcceptedCompletion),
    /// Another action on this shipment is processing or cooling down.
    Rejected { shipment_id: ShipmentId, step: Step },
    /// The action would change nothing, so no write was sent.
    Unchanged { shipment_id: ShipmentId, step: Step },
}

impl CompletionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CompletionOutcome::Accepted(_))
    }

    pub fn accepted(self) -> Option<AcceptedCompletion> {
        match self {
            CompletionOutcome::Accepted(accepted) => Some(accepted),
            CompletionOutcome::Rejected { .. } | CompletionOutcome::Unchanged { .. } => None,
        }
    }
}

/// One row of the shipment list.
#[derive(Debug, Clone)]
pub struct ShipmentOverview {
    pub shipment: Shipment,
    pub statuses: StepStatuses,
    pub next: NextStep,
}

fn plan_change(
    kind: CompletionKind,
    step: Step,
    shipment: &Shipment,
    note: &str,
) -> Result<ShipmentUpdate, WorkflowError> {
    let pointer = shipment.workflow_pointer;
    let mut update = ShipmentUpdate::new();

    match kind {
        CompletionKind::Confirm => {
            update = update.flag(step, true);
            if pointer == Some(step) {
                let next = step.next();
                if next.is_none() {
                    // Without a pointer, skipped steps would lose their
                    // implicit completion; flag them before clearing it
                    for earlier in Step::ALL.into_iter().take(step.position()) {
                        if !shipment.is_completed(earlier)
                            && derive_status(earlier, shipment) == DisplayStatus::Completed
                        {
                            update = update.flag(earlier, true);
                        }
                    }
                }
                update = update.pointer(next);
            }
            if step.accepts_comment() {
                update = update.note(step, "");
            }
        }
        CompletionKind::Skip => {
            let next = step
                .next()
                .ok_or(WorkflowError::CannotSkipFinalStep { step })?;
            // A step already behind the pointer does not pull it back
            if pointer.is_none_or(|p| p.position() <= step.position()) {
                update = update.pointer(Some(next));
            }
            if step.accepts_comment() {
                update = update.note(step, "");
            }
        }
        CompletionKind::MarkIncomplete => {
            if !step.accepts_comment() {
                return Err(WorkflowError::CommentNotAllowed { step });
            }
            if note.trim().is_empty() {
                return Err(WorkflowError::EmptyNote { step });
            }
            update = update.flag(step, false).note(step, note.trim());
        }
    }

    Ok(update)
}

/// Mirror `update` onto the local copy, the way the service applies it.
fn apply_locally(kind: CompletionKind, step: Step, update: &ShipmentUpdate, shipment: &mut Shipment) {
    for (flagged, completed) in &update.flags {
        shipment.set_completed(*flagged, *completed);
        if *completed {
            shipment.clear_comment(*flagged);
        }
    }
    if let Some(pointer) = update.workflow_pointer {
        shipment.workflow_pointer = pointer;
    }
    if let Some(note) = &update.note {
        shipment.set_comment(note.step, &note.text);
    }
    if kind == CompletionKind::Skip {
        shipment.clear_comment(step);
    }
}

#[derive(Clone)]
pub struct CompletionCoordinator {
    service: Arc<dyn ShipmentService>,
    board: Arc<Mutex<ShipmentBoard>>,
    // One guard per shipment; actions on different shipments never interfere
    guards: Arc<Mutex<HashMap<ShipmentId, ReentrancyGuard>>>,
    retry: RetryHandler,
    cooldown: Duration,
}

impl std::fmt::Debug for CompletionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionCoordinator")
            .field("retry", &self.retry)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

impl CompletionCoordinator {
    pub fn new(service: Arc<dyn ShipmentService>, config: &CoordinatorConfig) -> Self {
        Self::with_board(service, ShipmentBoard::new(), config)
    }

    pub fn with_board(
        service: Arc<dyn ShipmentService>,
        board: ShipmentBoard,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            service,
            board: Arc::new(Mutex::new(board)),
            guards: Arc::new(Mutex::new(HashMap::new())),
            retry: RetryHandler::new(config.retry.clone()),
            cooldown: config.cooldown(),
        }
    }

    /// Shared handle to the shipment list.
    pub fn board(&self) -> Arc<Mutex<ShipmentBoard>> {
        Arc::clone(&self.board)
    }

    /// Refetch every shipment and reconcile into the board.
    pub async fn refresh(&self) -> Result<RefreshOutcome, WorkflowError> {
        let ticket = self.board.lock().await.begin_refresh();
        let records = self.service.list_shipments().await?;
        let shipments: Vec<Shipment> = records.iter().map(ShipmentRecord::to_shipment).collect();

        let outcome = {
            let mut board = self.board.lock().await;
            let outcome = board.apply_refresh(ticket, shipments);

            // An idle guard is the same as no guard
            let now = Instant::now();
            self.guards
                .lock()
                .await
                .retain(|_, guard| guard.phase(now) != GuardPhase::Idle);
            outcome
        };
        info!(
            applied = outcome.applied,
            replaced = outcome.replaced,
            kept_local = outcome.kept_local.len(),
            removed = outcome.removed,
            "Shipment list refreshed"
        );
        Ok(outcome)
    }

    pub async fn overview(&self) -> Vec<ShipmentOverview> {
        self.board
            .lock()
            .await
            .shipments()
            .map(|shipment| ShipmentOverview {
                shipment: shipment.clone(),
                statuses: derive_all(shipment),
                next: next_step(shipment),
            })
            .collect()
    }

    /// Current guard phase for a shipment; `Idle` if it never had an action.
    pub async fn guard_phase(&self, id: &ShipmentId) -> GuardPhase {
        let mut guards = self.guards.lock().await;
        guards
            .get_mut(id)
            .map(|guard| guard.phase(Instant::now()))
            .unwrap_or(GuardPhase::Idle)
    }

    /// Step screen to open when the operator selects a shipment row.
    ///
    /// Returns `None` while the shipment is suppressed by a recent completion,
    /// so a stale click does not re-open the row that was just handled.
    pub async fn open_shipment(&self, id: &ShipmentId) -> Result<Option<NextStep>, WorkflowError> {
        let board = self.board.lock().await;
        let shipment = board
            .get(id)
            .ok_or_else(|| WorkflowError::ShipmentNotFound(id.clone()))?;

        let mut guards = self.guards.lock().await;
        if let Some(guard) = guards.get_mut(id) {
            if guard.is_suppressed(Instant::now()) {
                debug!(shipment_id = %id, "Navigation suppressed during cooldown");
                return Ok(None);
            }
        }
        Ok(Some(next_step(shipment)))
    }

    /// Submit a step from the comment surface.
    ///
    /// A non-empty comment marks the step incomplete; no comment confirms it.
    pub async fn complete_step(
        &self,
        id: &ShipmentId,
        step: Step,
        comment: Option<&str>,
    ) -> Result<CompletionOutcome, WorkflowError> {
        match comment.map(str::trim).filter(|text| !text.is_empty()) {
            Some(note) => self.mark_incomplete_with_note(id, step, note).await,
            None => self.confirm_step(id, step).await,
        }
    }

    /// Mark the step done: flag set, note cleared, pointer advanced if it
    /// sat on this step.
    pub async fn confirm_step(
        &self,
        id: &ShipmentId,
        step: Step,
    ) -> Result<CompletionOutcome, WorkflowError> {
        self.execute(id, step, CompletionKind::Confirm, "").await
    }

    /// Move the pointer past the step without setting its flag. The step then
    /// derives as completed from the pointer alone.
    pub async fn skip_step(
        &self,
        id: &ShipmentId,
        step: Step,
    ) -> Result<CompletionOutcome, WorkflowError> {
        self.execute(id, step, CompletionKind::Skip, "").await
    }

    /// Force a step back to incomplete by attaching an operator note.
    ///
    /// The flag is written as `false`. The step shows `Incomplete` when the
    /// pointer is past it and `InProgress` when the pointer is on it.
    pub async fn mark_incomplete_with_note(
        &self,
        id: &ShipmentId,
        step: Step,
        note: &str,
    ) -> Result<CompletionOutcome, WorkflowError> {
        self.execute(id, step, CompletionKind::MarkIncomplete, note).await
    }

    async fn execute(
        &self,
        id: &ShipmentId,
        step: Step,
        kind: CompletionKind,
        note: &str,
    ) -> Result<CompletionOutcome, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(kind.operation_name(), id, Some(step), &correlation_id);

        async move {
            let mut board = self.board.lock().await;
            let current = board
                .get(id)
                .ok_or_else(|| WorkflowError::ShipmentNotFound(id.clone()))?;
            let update = plan_change(kind, step, current, note)?;
            if update.is_empty() {
                debug!(shipment_id = %id, step = step.pointer_key(), "Nothing to change");
                return Ok(CompletionOutcome::Unchanged {
                    shipment_id: id.clone(),
                    step,
                });
            }

            let mut guards = self.guards.lock().await;
            let guard = guards
                .entry(id.clone())
                .or_insert_with(|| ReentrancyGuard::new(self.cooldown));
            if !guard.try_enter(Instant::now()) {
                debug!(shipment_id = %id, step = step.pointer_key(), "Rejected reentrant completion");
                return Ok(CompletionOutcome::Rejected {
                    shipment_id: id.clone(),
                    step,
                });
            }

            let (status, next) = match board.patch(id, |shipment| apply_locally(kind, step, &update, shipment)) {
                Some(shipment) => (derive_status(step, shipment), next_step(shipment)),
                None => {
                    guard.dispatched(Instant::now());
                    return Err(WorkflowError::ShipmentNotFound(id.clone()));
                }
            };

            board.write_started(id);
            let write = self.dispatch_write(id.clone(), update, correlation_id.clone());
            guard.dispatched(Instant::now());

            let navigation = if step.returns_to_list() {
                Navigation::ReturnToList { refresh: true }
            } else {
                Navigation::Stay
            };

            info!(
                shipment_id = %id,
                step = step.pointer_key(),
                status = %status,
                next = %next,
                "Step action applied"
            );

            Ok(CompletionOutcome::Accepted(AcceptedCompletion {
                shipment_id: id.clone(),
                step,
                kind,
                status,
                next,
                navigation,
                correlation_id: correlation_id.clone(),
                write,
            }))
        }
        .instrument(span)
        .await
    }

    fn dispatch_write(&self, id: ShipmentId, update: ShipmentUpdate, correlation_id: String) -> WriteHandle {
        let service = Arc::clone(&self.service);
        let board = Arc::clone(&self.board);
        let retry = self.retry.clone();

        tokio::spawn(
            async move {
                let result = retry
                    .execute_with_retry("update_shipment", || service.update_shipment(&id, &update))
                    .await;
                board.lock().await.write_settled(&id);
                match &result {
                    Ok(()) => info!(shipment_id = %id, "Shipment update synced"),
                    Err(e) => error!(
                        shipment_id = %id,
                        error = %e,
                        "Shipment update failed, keeping local state until next refresh"
                    ),
                }
                result
            }
            .instrument(tracing::info_span!("shipment_write", correlation.id = %correlation_id)),
        )
    }
}
