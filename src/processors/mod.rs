pub mod integrity_checker;
pub mod merger;
pub mod selector;

pub use integrity_checker::{
    CellStatistics, IntegrityChecker, IntegrityReport, RangeViolation, ViolationType,
};
pub use merger::TableMerger;
pub use selector::{Snapshot, SnapshotSelector};
