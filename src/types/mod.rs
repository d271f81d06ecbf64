mod articol;
mod reference;
mod validation;

pub use articol::{
    Articol, ArticolInput, ArticolPatch, ArticolWithReferences, NewArticol, REZUMAT_LEN, TITLU_LEN,
};
pub use reference::{
    ArticolTitle, NewReference, Reference, ReferenceInput, ReferencePatch, ReferenceWithArticol,
};
pub use validation::{FieldError, ValidationErrors, DATE_FORMAT};

/// Optional substring filters over Articol text fields. Empty strings count
/// as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ArticolFilter {
    pub titlu: Option<String>,
    pub rezumat: Option<String>,
}

impl ArticolFilter {
    pub fn titlu(&self) -> Option<&str> {
        self.titlu.as_deref().filter(|s| !s.is_empty())
    }

    pub fn rezumat(&self) -> Option<&str> {
        self.rezumat.as_deref().filter(|s| !s.is_empty())
    }
}
