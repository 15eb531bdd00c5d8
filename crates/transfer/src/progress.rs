use chunkvault_protocol::{Direction, OperationId, TransferEvent};

/// Percentage of `completed` out of `total`, in `0.0..=100.0`.
///
/// A transfer with nothing to do is complete, so `total == 0` yields 100.
pub fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// In-memory state of one running transfer.
///
/// Owned by the orchestrator running the operation and dropped when the
/// operation completes or fails. Never persisted.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    operation_id: OperationId,
    direction: Direction,
    total_units: usize,
    completed_units: usize,
}

impl TransferProgress {
    pub fn new(operation_id: OperationId, direction: Direction, total_units: usize) -> Self {
        Self {
            operation_id,
            direction,
            total_units,
            completed_units: 0,
        }
    }

    /// Records one finished chunk and returns the matching progress event.
    pub fn advance(&mut self) -> TransferEvent {
        self.completed_units = (self.completed_units + 1).min(self.total_units);
        TransferEvent::Progress {
            operation_id: self.operation_id.clone(),
            direction: self.direction,
            percent: self.percent(),
        }
    }

    pub fn percent(&self) -> f64 {
        percent(self.completed_units, self.total_units)
    }

    pub fn operation_id(&self) -> &OperationId {
        &self.operation_id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn total_units(&self) -> usize {
        self.total_units
    }

    pub fn completed_units(&self) -> usize {
        self.completed_units
    }

    pub fn is_complete(&self) -> bool {
        self.completed_units >= self.total_units
    }
}
