pub mod service;
pub mod store;

pub use service::{
    CellStat, EarthObservationService, HttpEoService, Reducer, SeriesRequest, SeriesStat,
    StaticRequest,
};
pub use store::{FileStore, HttpStore, LocalDirStore};
