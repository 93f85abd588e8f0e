//! Scan DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::ScanOutcome;
use crate::interfaces::http::common::ViewContext;
use crate::interfaces::http::modules::reservations::ReservationDetailDto;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScanParams {
    /// Scanned barcode number or typed mobile number; blank resets the search
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    /// `true` when the input was blank and the caller should clear its view
    pub reset: bool,
    /// Matching admitted and paid reservations, newest first
    pub matches: Vec<ReservationDetailDto>,
}

impl ScanResponse {
    pub fn from_outcome(outcome: &ScanOutcome, view: ViewContext) -> Self {
        Self {
            reset: outcome.is_reset(),
            matches: outcome
                .matches()
                .iter()
                .map(|d| ReservationDetailDto::from_domain(d, view))
                .collect(),
        }
    }
}
