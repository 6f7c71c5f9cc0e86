//! Response shapes returned by the optimization endpoints
//!
//! Every field is optional: the presenter renders whatever subset the
//! backend sends and substitutes placeholders for the rest.

use serde::Deserialize;

/// Response of the trip optimization endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripResponse {
    #[serde(default)]
    pub results: Option<Vec<TripOption>>,

    /// Departure timestamp of the fastest option
    #[serde(default)]
    pub best_departure: Option<String>,

    #[serde(default)]
    pub min_duration_seconds: Option<f64>,

    #[serde(default)]
    pub best_route_summary: Option<String>,
}

/// A single sampled departure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripOption {
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub requested_time: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub duration_text: Option<String>,
    #[serde(default)]
    pub route_summary: Option<String>,
    #[serde(default)]
    pub actual_departure_text: Option<String>,
    #[serde(default)]
    pub arrival_text: Option<String>,
}

/// Response of the work-schedule optimization endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkResponse {
    #[serde(default)]
    pub results: Option<Vec<WorkSchedule>>,

    #[serde(default)]
    pub best_schedule: Option<WorkSchedule>,
}

/// A round trip: home to work, a stay, then work to home
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkSchedule {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub departure_to_work: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration_to_work: Option<f64>,
    #[serde(default)]
    pub route_to_work: Option<String>,
    #[serde(default)]
    pub leave_work_time: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration_to_home: Option<f64>,
    #[serde(default)]
    pub route_to_home: Option<String>,
    #[serde(default)]
    pub total_commute_seconds: Option<f64>,
    #[serde(default)]
    pub total_commute_text: Option<String>,
}
