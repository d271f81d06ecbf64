use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{articol::TITLU_LEN, validation::ValidationErrors};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reference {
    pub reference_id: i64,
    pub reference_titlu: String,
    pub reference_data: NaiveDate,
    pub lista_autori: String,
    pub articol_id: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticolTitle {
    #[serde(rename = "ArticolTitlu")]
    pub articol_titlu: String,
}

/// A Reference read through its parent, carrying the parent's title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceWithArticol {
    #[serde(flatten)]
    pub reference: Reference,
    pub articol: ArticolTitle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReference {
    pub titlu: String,
    pub data: NaiveDate,
    pub lista_autori: String,
}

/// Raw create body. `ArticolId` is taken from the route, never from here.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReferenceInput {
    pub reference_titlu: Option<String>,
    pub reference_data: Option<String>,
    pub lista_autori: Option<String>,
}

impl ReferenceInput {
    pub fn validate(&self) -> Result<NewReference, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let titlu = errors.required_text(
            "ReferenceTitlu",
            self.reference_titlu.as_deref(),
            Some(TITLU_LEN),
        );
        let data = errors.required_date("ReferenceData", self.reference_data.as_deref());
        let lista_autori = errors.required_text("ListaAutori", self.lista_autori.as_deref(), None);

        match (titlu, data, lista_autori) {
            (Some(titlu), Some(data), Some(lista_autori)) if errors.is_empty() => {
                Ok(NewReference {
                    titlu,
                    data,
                    lista_autori,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Update body. `ReferenceId` must be present and equal to the route id.
/// A Reference cannot be moved to another Articol, so `ArticolId` is ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReferencePatch {
    pub reference_id: Option<i64>,
    pub reference_titlu: Option<String>,
    pub reference_data: Option<String>,
    pub lista_autori: Option<String>,
}

impl ReferencePatch {
    pub fn apply_to(&self, current: &Reference) -> Result<Reference, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut next = current.clone();

        if let Some(titlu) = self.reference_titlu.as_deref() {
            if let Some(titlu) = errors.text("ReferenceTitlu", titlu, Some(TITLU_LEN)) {
                next.reference_titlu = titlu;
            }
        }
        if let Some(data) = self.reference_data.as_deref() {
            if let Some(data) = errors.date("ReferenceData", data) {
                next.reference_data = data;
            }
        }
        if let Some(autori) = self.lista_autori.as_deref() {
            if let Some(autori) = errors.text("ListaAutori", autori, None) {
                next.lista_autori = autori;
            }
        }

        errors.into_result(|| next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Reference {
        let now = Utc::now();
        Reference {
            reference_id: 3,
            reference_titlu: "Ref Title One".to_string(),
            reference_data: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            lista_autori: "A. One".to_string(),
            articol_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn valid_input_is_accepted() {
        let input: ReferenceInput = serde_json::from_str(
            r#"{"ReferenceTitlu":"Ref Title One","ReferenceData":"2024-02-01","ListaAutori":"A. One","ArticolId":99}"#,
        )
        .unwrap();
        let new = input.validate().unwrap();
        assert_eq!(new.titlu, "Ref Title One");
        assert_eq!(new.lista_autori, "A. One");
    }

    #[test]
    fn missing_authors_and_bad_date_are_rejected() {
        let input = ReferenceInput {
            reference_titlu: Some("Ref Title One".to_string()),
            reference_data: Some("01/02/2024".to_string()),
            lista_autori: None,
        };
        let err = input.validate().unwrap_err();
        let fields: Vec<_> = err.fields().iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["ReferenceData", "ListaAutori"]);
    }

    #[test]
    fn empty_author_list_is_accepted() {
        let input = ReferenceInput {
            reference_titlu: Some("Ref Title One".to_string()),
            reference_data: Some("2024-02-01".to_string()),
            lista_autori: Some(String::new()),
        };
        assert_eq!(input.validate().unwrap().lista_autori, "");
    }

    #[test]
    fn patch_keeps_parent() {
        let patch: ReferencePatch = serde_json::from_str(
            r#"{"ReferenceId":3,"ListaAutori":"A. One, B. Two","ArticolId":42}"#,
        )
        .unwrap();
        let next = patch.apply_to(&stored()).unwrap();
        assert_eq!(next.lista_autori, "A. One, B. Two");
        assert_eq!(next.articol_id, 1);
    }

    #[test]
    fn with_articol_flattens_reference_fields() {
        let value = serde_json::to_value(ReferenceWithArticol {
            reference: stored(),
            articol: ArticolTitle {
                articol_titlu: "Parent title".to_string(),
            },
        })
        .unwrap();
        assert_eq!(value["ReferenceId"], 3);
        assert_eq!(value["ArticolId"], 1);
        assert_eq!(value["articol"]["ArticolTitlu"], "Parent title");
    }
}
