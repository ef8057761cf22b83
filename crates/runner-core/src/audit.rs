use std::time::{Duration, Instant};

/// What happened to a child of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Run completed successfully.
    Executed,
    /// Run failed.
    Failed,
    /// Rolled back after a successful run.
    RolledBack,
    /// Rollback was attempted and failed.
    RollbackFailed,
    /// Dry run completed successfully.
    Previewed,
    /// Dry run failed.
    PreviewFailed,
}

/// Record of one child of a sequence.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Position of the child in its sequence.
    pub index: usize,
    /// Display name of the child.
    pub name: String,
    pub status: StepStatus,
    pub started_at: Instant,
    /// When the latest run, dry run, or rollback of the child finished.
    pub completed_at: Option<Instant>,
    /// What happened inside the child, when it is a nested sequence.
    pub children: AuditLog,
}

impl StepRecord {
    /// Time between the start and the latest completion.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at
            .map(|completed| completed.saturating_duration_since(self.started_at))
    }

    /// Whether this record stands for a single step rather than a group.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Log of what a sequence did to its children, in the order they started.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: Vec<StepRecord>,
}

impl AuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, index: usize, name: String, status: StepStatus) {
        self.records.push(StepRecord {
            index,
            name,
            status,
            started_at: Instant::now(),
            completed_at: None,
            children: AuditLog::new(),
        });
    }

    /// Settle the most recently started record.
    pub(crate) fn record_outcome(&mut self, status: StepStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Update the record of child `index`, or add one if the child was run
    /// before this log existed.
    pub(crate) fn record_rollback(&mut self, index: usize, name: String, status: StepStatus) {
        let now = Instant::now();
        if let Some(record) = self.find_mut(index) {
            record.status = status;
            record.completed_at = Some(now);
        } else {
            self.records.push(StepRecord {
                index,
                name,
                status,
                started_at: now,
                completed_at: Some(now),
                children: AuditLog::new(),
            });
        }
    }

    /// Detach the nested log of child `index`, leaving an empty one behind.
    pub(crate) fn take_children(&mut self, index: usize) -> AuditLog {
        self.find_mut(index)
            .map(|record| std::mem::take(&mut record.children))
            .unwrap_or_default()
    }

    /// Attach `children` as the nested log of child `index`.
    pub(crate) fn set_children(&mut self, index: usize, children: AuditLog) {
        if let Some(record) = self.find_mut(index) {
            record.children = children;
        }
    }

    fn find_mut(&mut self, index: usize) -> Option<&mut StepRecord> {
        self.records.iter_mut().rev().find(|r| r.index == index)
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Records with the given status, in log order.
    pub fn with_status(&self, status: StepStatus) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of single steps with the given status, looking through groups.
    #[must_use]
    pub fn count_leaves(&self, status: StepStatus) -> usize {
        self.records
            .iter()
            .map(|record| {
                if record.is_leaf() {
                    usize::from(record.status == status)
                } else {
                    record.children.count_leaves(status)
                }
            })
            .sum()
    }

    /// One marked line per record, for display. Nested records are indented
    /// under their group.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.records.len());
        self.push_summary(0, &mut lines);
        lines.join("\n")
    }

    fn push_summary(&self, depth: usize, lines: &mut Vec<String>) {
        for record in &self.records {
            let mark = match record.status {
                StepStatus::Executed => "✓",
                StepStatus::Failed | StepStatus::PreviewFailed => "✗",
                StepStatus::RolledBack => "↩",
                StepStatus::RollbackFailed => "⚠",
                StepStatus::Previewed => "○",
            };
            lines.push(format!("{:indent$}{mark} {}", "", record.name, indent = depth * 2));
            record.children.push_summary(depth + 1, lines);
        }
    }
}
