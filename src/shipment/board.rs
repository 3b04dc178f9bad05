// Shipment board - the in-memory shipment list shared by refetches and
// optimistic completion patches

use crate::shipment::{Shipment, ShipmentId};
use crate::workflows::{derive_all, next_step, NextStep, Step, StepStatuses};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-step notes attached to shipments.
///
/// The store does not restrict which steps take a note and does not clear
/// notes on completion by itself; callers clear a step's note when it
/// becomes completed. Blank text is the same as clearing.
pub trait CommentOverrideStore {
    fn set_comment(&mut self, id: &ShipmentId, step: Step, text: &str);
    fn get_comment(&self, id: &ShipmentId, step: Step) -> Option<String>;
    fn clear_comment(&mut self, id: &ShipmentId, step: Step);
}

#[derive(Debug, Clone)]
struct BoardEntry {
    shipment: Shipment,
    // Board revision of the last local patch, 0 when the entry is as fetched
    patched_at: u64,
    // Remote writes dispatched but not yet settled
    pending_writes: u32,
    // Refreshes issued when the last write settled; responses to those may
    // predate the write
    settled_before_refresh: u64,
}

impl BoardEntry {
    fn fetched(shipment: Shipment) -> Self {
        Self {
            shipment,
            patched_at: 0,
            pending_writes: 0,
            settled_before_refresh: 0,
        }
    }

    /// Whether a response for `ticket` may be older than this entry's local state.
    fn is_newer_than(&self, ticket: RefreshTicket) -> bool {
        self.patched_at > ticket.revision
            || self.pending_writes > 0
            || ticket.id <= self.settled_before_refresh
    }
}

/// Issued when a refetch starts; presented again when its response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    id: u64,
    revision: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// False when the response was older than one already applied.
    pub applied: bool,
    pub replaced: usize,
    pub kept_local: Vec<ShipmentId>,
    pub removed: usize,
}

#[derive(Debug, Default)]
pub struct ShipmentBoard {
    entries: BTreeMap<ShipmentId, BoardEntry>,
    revision: u64,
    issued_refreshes: u64,
    applied_refresh: u64,
}

impl ShipmentBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A board loaded with `shipments` as if freshly fetched.
    pub fn from_shipments(shipments: impl IntoIterator<Item = Shipment>) -> Self {
        let mut board = Self::new();
        let ticket = board.begin_refresh();
        board.apply_refresh(ticket, shipments);
        board
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ShipmentId) -> Option<&Shipment> {
        self.entries.get(id).map(|entry| &entry.shipment)
    }

    pub fn shipments(&self) -> impl Iterator<Item = &Shipment> {
        self.entries.values().map(|entry| &entry.shipment)
    }

    pub fn statuses(&self, id: &ShipmentId) -> Option<StepStatuses> {
        self.get(id).map(derive_all)
    }

    pub fn next_step(&self, id: &ShipmentId) -> Option<NextStep> {
        self.get(id).map(next_step)
    }

    /// Apply an optimistic local change. Returns `None` for unknown shipments.
    pub fn patch<F>(&mut self, id: &ShipmentId, change: F) -> Option<&Shipment>
    where
        F: FnOnce(&mut Shipment),
    {
        let entry = self.entries.get_mut(id)?;
        self.revision += 1;
        change(&mut entry.shipment);
        entry.patched_at = self.revision;
        Some(&entry.shipment)
    }

    /// Record a dispatched remote write for `id`. Until it settles, refreshes
    /// keep the local state of this shipment.
    pub fn write_started(&mut self, id: &ShipmentId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.pending_writes += 1;
        }
    }

    /// Record that a write for `id` finished, successfully or not. Refreshes
    /// already issued may still carry pre-write data, so only a refresh issued
    /// after this point replaces the local state.
    pub fn write_settled(&mut self, id: &ShipmentId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.pending_writes = entry.pending_writes.saturating_sub(1);
            entry.settled_before_refresh = self.issued_refreshes;
        }
    }

    pub fn has_pending_write(&self, id: &ShipmentId) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.pending_writes > 0)
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued_refreshes += 1;
        RefreshTicket {
            id: self.issued_refreshes,
            revision: self.revision,
        }
    }

    /// Reconcile a fetched list into the board.
    ///
    /// The server list wins, except for shipments patched locally after the
    /// fetch began or with a remote write that had not settled before it:
    /// those keep their optimistic state until a later refresh.
    /// A response for a ticket older than the last applied one is dropped.
    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        shipments: impl IntoIterator<Item = Shipment>,
    ) -> RefreshOutcome {
        if ticket.id <= self.applied_refresh {
            debug!(
                ticket = ticket.id,
                applied = self.applied_refresh,
                "Discarding stale shipment refresh"
            );
            return RefreshOutcome::default();
        }
        self.applied_refresh = ticket.id;

        let mut outcome = RefreshOutcome {
            applied: true,
            ..Default::default()
        };
        let mut previous = std::mem::take(&mut self.entries);

        for shipment in shipments {
            let id = shipment.id.clone();
            match previous.remove(&id) {
                Some(local) if local.is_newer_than(ticket) => {
                    outcome.kept_local.push(id.clone());
                    self.entries.insert(id, local);
                }
                _ => {
                    outcome.replaced += 1;
                    self.entries.insert(id, BoardEntry::fetched(shipment));
                }
            }
        }

        // Shipments the server no longer lists
        for (id, local) in previous {
            if local.is_newer_than(ticket) {
                outcome.kept_local.push(id.clone());
                self.entries.insert(id, local);
            } else {
                outcome.removed += 1;
            }
        }

        outcome
    }
}

impl CommentOverrideStore for ShipmentBoard {
    fn set_comment(&mut self, id: &ShipmentId, step: Step, text: &str) {
        if self.patch(id, |shipment| shipment.set_comment(step, text)).is_none() {
            debug!(shipment_id = %id, step = %step, "Ignoring comment for unknown shipment");
        }
    }

    fn get_comment(&self, id: &ShipmentId, step: Step) -> Option<String> {
        self.get(id)
            .and_then(|shipment| shipment.comment(step))
            .map(str::to_string)
    }

    fn clear_comment(&mut self, id: &ShipmentId, step: Step) {
        self.patch(id, |shipment| shipment.clear_comment(step));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::DisplayStatus;

    fn id(value: &str) -> ShipmentId {
        ShipmentId::new(value)
    }

    #[test]
    fn test_comment_store_round_trip() {
        let mut board = ShipmentBoard::from_shipments([Shipment::new("SHP-1")]);

        board.set_comment(&id("SHP-1"), Step::LabelCheck, "label torn");
        assert_eq!(
            board.get_comment(&id("SHP-1"), Step::LabelCheck).as_deref(),
            Some("label torn")
        );
        assert_eq!(board.get_comment(&id("SHP-1"), Step::FormulaCheck), None);

        board.clear_comment(&id("SHP-1"), Step::LabelCheck);
        assert_eq!(board.get_comment(&id("SHP-1"), Step::LabelCheck), None);
    }

    #[test]
    fn test_store_accepts_any_step() {
        let mut board = ShipmentBoard::from_shipments([Shipment::new("SHP-1")]);
        board.set_comment(&id("SHP-1"), Step::SortFormulas, "bin mislabeled");
        assert!(board.get_comment(&id("SHP-1"), Step::SortFormulas).is_some());
    }

    #[test]
    fn test_comment_for_unknown_shipment_is_ignored() {
        let mut board = ShipmentBoard::new();
        board.set_comment(&id("nope"), Step::LabelCheck, "x");
        assert!(board.is_empty());
    }

    #[test]
    fn test_refresh_overwrites_unpatched_entries() {
        let mut board = ShipmentBoard::from_shipments([Shipment::new("SHP-1"), Shipment::new("SHP-2")]);

        let ticket = board.begin_refresh();
        let outcome = board.apply_refresh(
            ticket,
            [Shipment::new("SHP-1").with_pointer(Some(Step::LabelCheck))],
        );

        assert!(outcome.applied);
        assert_eq!(outcome.replaced, 1);
        assert_eq!(outcome.removed, 1);
        assert_eq!(
            board.get(&id("SHP-1")).unwrap().workflow_pointer,
            Some(Step::LabelCheck)
        );
        assert!(board.get(&id("SHP-2")).is_none());
    }

    #[test]
    fn test_patch_after_fetch_began_survives_response() {
        let mut board = ShipmentBoard::from_shipments([Shipment::new("SHP-1")]);

        let ticket = board.begin_refresh();
        board.patch(&id("SHP-1"), |shipment| shipment.set_completed(Step::AddProducts, true));
        let outcome = board.apply_refresh(ticket, [Shipment::new("SHP-1")]);

        assert_eq!(outcome.kept_local, vec![id("SHP-1")]);
        assert_eq!(
            board.statuses(&id("SHP-1")).unwrap().get(Step::AddProducts),
            DisplayStatus::Completed
        );

        // The next refresh started after the patch is authoritative again
        let ticket = board.begin_refresh();
        board.apply_refresh(ticket, [Shipment::new("SHP-1")]);
        assert!(!board.get(&id("SHP-1")).unwrap().is_completed(Step::AddProducts));
    }

    #[test]
    fn test_pending_write_survives_refresh_started_after_patch() {
        let mut board = ShipmentBoard::from_shipments([Shipment::new("SHP-1")]);

        board.patch(&id("SHP-1"), |shipment| shipment.set_completed(Step::AddProducts, true));
        board.write_started(&id("SHP-1"));
        assert!(board.has_pending_write(&id("SHP-1")));

        let ticket = board.begin_refresh();
        let outcome = board.apply_refresh(ticket, [Shipment::new("SHP-1")]);
        assert_eq!(outcome.kept_local, vec![id("SHP-1")]);
        assert!(board.get(&id("SHP-1")).unwrap().is_completed(Step::AddProducts));
    }

    #[test]
    fn test_refresh_issued_before_write_settled_is_not_trusted() {
        let mut board = ShipmentBoard::from_shipments([Shipment::new("SHP-1")]);

        board.patch(&id("SHP-1"), |shipment| shipment.set_completed(Step::AddProducts, true));
        board.write_started(&id("SHP-1"));
        let in_flight = board.begin_refresh();
        board.write_settled(&id("SHP-1"));
        assert!(!board.has_pending_write(&id("SHP-1")));

        // Fetched while the write was still in flight
        board.apply_refresh(in_flight, [Shipment::new("SHP-1")]);
        assert!(board.get(&id("SHP-1")).unwrap().is_completed(Step::AddProducts));

        // Issued after the write settled: authoritative
        let ticket = board.begin_refresh();
        let outcome = board.apply_refresh(ticket, [Shipment::new("SHP-1")]);
        assert_eq!(outcome.replaced, 1);
        assert!(!board.get(&id("SHP-1")).unwrap().is_completed(Step::AddProducts));
    }

    #[test]
    fn test_out_of_order_responses_drop_the_older() {
        let mut board = ShipmentBoard::from_shipments([Shipment::new("SHP-1")]);

        let older = board.begin_refresh();
        let newer = board.begin_refresh();

        let applied = board.apply_refresh(
            newer,
            [Shipment::new("SHP-1").with_pointer(Some(Step::BookShipment))],
        );
        let stale = board.apply_refresh(older, [Shipment::new("SHP-1")]);

        assert!(applied.applied);
        assert!(!stale.applied);
        assert_eq!(
            board.next_step(&id("SHP-1")),
            Some(NextStep::Step(Step::BookShipment))
        );
    }
}
