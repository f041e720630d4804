pub mod layers;
pub mod whatif;

pub use layers::{LayerKind, LayerStyle};
pub use whatif::{severity_for_temperature, Adjustment, OverrideSession};
