pub mod grid;
pub mod label;
pub mod merged;
pub mod observation;

pub use grid::{CellBounds, Grid, GridCell, GridSpec};
pub use label::SeverityLabel;
pub use merged::{LabeledRecord, MergedRecord, MergedRecordBuilder, FEATURE_COLUMNS, LABEL_COLUMNS};
pub use observation::{
    ObservationRow, SampleKey, VariableKind, VariableTable, ARTIFACT_KEY_COLUMNS,
};
