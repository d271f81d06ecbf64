use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{validation::ValidationErrors, Reference};

pub const TITLU_LEN: (usize, usize) = (5, 100);
pub const REZUMAT_LEN: (usize, usize) = (10, 200);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Articol {
    pub articol_id: i64,
    pub articol_titlu: String,
    pub articol_rezumat: String,
    pub articol_data: NaiveDate,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// An Articol together with every Reference that points at it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticolWithReferences {
    #[serde(flatten)]
    pub articol: Articol,
    #[serde(rename = "Reference")]
    pub references: Vec<Reference>,
}

/// Validated fields of an Articol that does not exist yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewArticol {
    pub titlu: String,
    pub rezumat: String,
    pub data: NaiveDate,
}

/// Raw create body. Every field is optional here so that a missing field is
/// reported as a validation failure rather than a decode error.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArticolInput {
    pub articol_titlu: Option<String>,
    pub articol_rezumat: Option<String>,
    pub articol_data: Option<String>,
}

impl ArticolInput {
    pub fn validate(&self) -> Result<NewArticol, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let titlu =
            errors.required_text("ArticolTitlu", self.articol_titlu.as_deref(), Some(TITLU_LEN));
        let rezumat = errors.required_text(
            "ArticolRezumat",
            self.articol_rezumat.as_deref(),
            Some(REZUMAT_LEN),
        );
        let data = errors.required_date("ArticolData", self.articol_data.as_deref());

        match (titlu, rezumat, data) {
            (Some(titlu), Some(rezumat), Some(data)) if errors.is_empty() => Ok(NewArticol {
                titlu,
                rezumat,
                data,
            }),
            _ => Err(errors),
        }
    }
}

/// Update body. `ArticolId` must be present and equal to the route id.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArticolPatch {
    pub articol_id: Option<i64>,
    pub articol_titlu: Option<String>,
    pub articol_rezumat: Option<String>,
    pub articol_data: Option<String>,
}

impl ArticolPatch {
    /// Returns `current` with the supplied fields replaced. Timestamps are
    /// left alone; storage stamps `updated_at` on write.
    pub fn apply_to(&self, current: &Articol) -> Result<Articol, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut next = current.clone();

        if let Some(titlu) = self.articol_titlu.as_deref() {
            if let Some(titlu) = errors.text("ArticolTitlu", titlu, Some(TITLU_LEN)) {
                next.articol_titlu = titlu;
            }
        }
        if let Some(rezumat) = self.articol_rezumat.as_deref() {
            if let Some(rezumat) = errors.text("ArticolRezumat", rezumat, Some(REZUMAT_LEN)) {
                next.articol_rezumat = rezumat;
            }
        }
        if let Some(data) = self.articol_data.as_deref() {
            if let Some(data) = errors.date("ArticolData", data) {
                next.articol_data = data;
            }
        }

        errors.into_result(|| next)
    }
}
