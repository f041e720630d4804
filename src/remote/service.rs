use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::{DateWindow, ServiceConfig};
use crate::error::{PipelineError, Result};
use crate::models::Grid;

/// Spatial statistic computed server-side over each cell geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Sum,
    /// Fraction of pixels equal to a class value (land-cover masks)
    FractionEqual(u32),
}

impl Reducer {
    fn wire_name(&self) -> &'static str {
        match self {
            Reducer::Mean => "MEAN",
            Reducer::Sum => "SUM",
            Reducer::FractionEqual(_) => "FRACTION_EQUAL",
        }
    }

    fn class_value(&self) -> Option<u32> {
        match self {
            Reducer::FractionEqual(class) => Some(*class),
            _ => None,
        }
    }
}

/// Reduction of an image collection over the grid, one row per cell per day.
#[derive(Debug, Clone)]
pub struct SeriesRequest {
    pub dataset: String,
    pub bands: Vec<String>,
    pub reducer: Reducer,
    pub scale_m: u32,
    pub window: DateWindow,
}

/// Reduction of a single static image over the grid, one row per cell.
#[derive(Debug, Clone)]
pub struct StaticRequest {
    pub dataset: String,
    pub band: String,
    pub reducer: Reducer,
    pub scale_m: u32,
}

/// Per-cell daily statistics. A band maps to `None` where the service had
/// no data for that cell and day.
#[derive(Debug, Clone)]
pub struct SeriesStat {
    pub date: NaiveDate,
    pub grid_id: u32,
    pub values: HashMap<String, Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct CellStat {
    pub grid_id: u32,
    pub value: Option<f64>,
}

/// Narrow face of the remote earth-observation query service. Every request
/// is attempted exactly once; retry policy is deliberately absent.
#[async_trait]
pub trait EarthObservationService: Send + Sync {
    async fn reduce_series(&self, grid: &Grid, request: &SeriesRequest) -> Result<Vec<SeriesStat>>;

    async fn reduce_static(&self, grid: &Grid, request: &StaticRequest) -> Result<Vec<CellStat>>;
}

/// HTTP implementation speaking a JSON reduction protocol.
pub struct HttpEoService {
    client: reqwest::Client,
    endpoint: String,
    project: String,
}

impl HttpEoService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project: config.project.clone(),
        })
    }

    fn url(&self, operation: &str) -> String {
        format!(
            "{}/projects/{}/table:{}",
            self.endpoint, self.project, operation
        )
    }

    fn features(grid: &Grid) -> Vec<WireFeature> {
        grid.cells()
            .iter()
            .map(|cell| {
                let bounds = grid.cell_bounds(cell);
                WireFeature {
                    grid_id: cell.id,
                    latitude: cell.lat_center,
                    longitude: cell.lon_center,
                    bounds: [
                        bounds.lon_min,
                        bounds.lat_min,
                        bounds.lon_max,
                        bounds.lat_max,
                    ],
                }
            })
            .collect()
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        dataset: &str,
        body: &B,
    ) -> Result<R> {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::RemoteQuery {
                dataset: dataset.to_string(),
                message: format!("service returned {}", response.status()),
            });
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl EarthObservationService for HttpEoService {
    async fn reduce_series(&self, grid: &Grid, request: &SeriesRequest) -> Result<Vec<SeriesStat>> {
        let body = WireSeriesRequest {
            dataset: &request.dataset,
            bands: &request.bands,
            reducer: request.reducer.wire_name(),
            class_value: request.reducer.class_value(),
            scale_meters: request.scale_m,
            start_date: request.window.start,
            end_date: request.window.end,
            features: Self::features(grid),
        };

        let response: WireSeriesResponse = self
            .post(&self.url("reduceSeries"), &request.dataset, &body)
            .await?;

        Ok(response
            .rows
            .into_iter()
            .map(|row| SeriesStat {
                date: row.date,
                grid_id: row.grid_id,
                values: row.values,
            })
            .collect())
    }

    async fn reduce_static(&self, grid: &Grid, request: &StaticRequest) -> Result<Vec<CellStat>> {
        let body = WireStaticRequest {
            dataset: &request.dataset,
            band: &request.band,
            reducer: request.reducer.wire_name(),
            class_value: request.reducer.class_value(),
            scale_meters: request.scale_m,
            features: Self::features(grid),
        };

        let response: WireStaticResponse = self
            .post(&self.url("reduceImage"), &request.dataset, &body)
            .await?;

        Ok(response
            .rows
            .into_iter()
            .map(|row| CellStat {
                grid_id: row.grid_id,
                value: row.value,
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFeature {
    grid_id: u32,
    latitude: f64,
    longitude: f64,
    /// [lon_min, lat_min, lon_max, lat_max]
    bounds: [f64; 4],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSeriesRequest<'a> {
    dataset: &'a str,
    bands: &'a [String],
    reducer: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_value: Option<u32>,
    scale_meters: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    features: Vec<WireFeature>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireStaticRequest<'a> {
    dataset: &'a str,
    band: &'a str,
    reducer: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_value: Option<u32>,
    scale_meters: u32,
    features: Vec<WireFeature>,
}

#[derive(Debug, Deserialize)]
struct WireSeriesResponse {
    rows: Vec<WireSeriesRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSeriesRow {
    date: NaiveDate,
    grid_id: u32,
    #[serde(default)]
    values: HashMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct WireStaticResponse {
    rows: Vec<WireStaticRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStaticRow {
    grid_id: u32,
    value: Option<f64>,
}
