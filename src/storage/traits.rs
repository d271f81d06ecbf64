use anyhow::Result;

use super::relation::Relation;
use crate::types::{
    Articol, ArticolFilter, ArticolWithReferences, NewArticol, NewReference, Reference,
    ReferenceWithArticol,
};

pub trait StorageRead {
    fn list_articole(&self) -> Result<Vec<Articol>>;
    fn list_articole_full(&self) -> Result<Vec<ArticolWithReferences>>;
    fn list_articole_by_date_desc(&self) -> Result<Vec<Articol>>;
    fn filter_articole(&self, filter: &ArticolFilter) -> Result<Vec<Articol>>;
    fn load_articol(&self, articol_id: i64) -> Result<Option<Articol>>;

    fn list_references(&self) -> Result<Vec<Reference>>;
    fn list_references_by_articol(&self, articol_id: i64) -> Result<Vec<ReferenceWithArticol>>;
    fn load_reference(
        &self,
        articol_id: i64,
        reference_id: i64,
    ) -> Result<Option<ReferenceWithArticol>>;
    fn count_references(&self, articol_id: i64) -> Result<u64>;
}

pub trait StorageWrite {
    fn insert_articol(&self, articol: &NewArticol) -> Result<Articol>;
    fn update_articol(&self, articol: &Articol) -> Result<Articol>;
    fn delete_articol(&self, articol_id: i64) -> Result<usize>;

    fn insert_reference(&self, articol_id: i64, reference: &NewReference) -> Result<Reference>;
    fn update_reference(&self, reference: &Reference) -> Result<Reference>;
    fn delete_reference(&self, articol_id: i64, reference_id: i64) -> Result<usize>;
    fn delete_references_by_articol(&self, articol_id: i64) -> Result<usize>;
}

pub trait StorageTx: StorageRead + StorageWrite {
    fn commit(self) -> Result<()>;
}

pub trait Storage: StorageRead {
    type Tx: StorageTx;

    fn relation(&self) -> &Relation;
    /// Opens a write transaction that holds the writer lock from the start.
    fn begin_tx(&self) -> Result<Self::Tx>;
    /// Opens a transaction for consistent multi-step reads. It does not
    /// block concurrent writers until it first writes.
    fn begin_read(&self) -> Result<Self::Tx>;
    /// Drops every table and creates the schema again.
    fn recreate_schema(&self) -> Result<()>;
}
