//! Query and mutation operations over Articol and Reference.
//!
//! Every operation that addresses a record by id checks that the parent
//! Articol exists before touching its children. The check and the dependent
//! read or write share one storage transaction.

mod error;

use std::path::{Path, PathBuf};

pub use error::{RepoError, RepoResult};

use crate::{
    export,
    storage::{OnDelete, Storage, StorageRead, StorageTx, StorageWrite},
    types::{
        Articol, ArticolFilter, ArticolInput, ArticolPatch, ArticolWithReferences, Reference,
        ReferenceInput, ReferencePatch, ReferenceWithArticol,
    },
};

#[derive(Clone)]
pub struct Repository<S: Storage> {
    storage: S,
}

fn ensure_articol<R: StorageRead + ?Sized>(reader: &R, articol_id: i64) -> RepoResult<Articol> {
    match reader.load_articol(articol_id)? {
        Some(articol) => Ok(articol),
        None => {
            log::warn!("Articol {} not found", articol_id);
            Err(RepoError::ArticolNotFound(articol_id))
        }
    }
}

fn ensure_reference<R: StorageRead + ?Sized>(
    reader: &R,
    articol_id: i64,
    reference_id: i64,
) -> RepoResult<ReferenceWithArticol> {
    match reader.load_reference(articol_id, reference_id)? {
        Some(reference) => Ok(reference),
        None => {
            log::warn!(
                "Reference {} not found for articol {}",
                reference_id,
                articol_id
            );
            Err(RepoError::ReferenceNotFound {
                articol_id,
                reference_id,
            })
        }
    }
}

fn ensure_same_id(route: i64, body: Option<i64>) -> RepoResult<()> {
    if body == Some(route) {
        return Ok(());
    }
    log::warn!("Route id {} differs from body id {:?}", route, body);
    Err(RepoError::IdMismatch { route, body })
}

impl<S: Storage> Repository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn recreate_schema(&self) -> RepoResult<()> {
        self.storage.recreate_schema()?;
        log::info!("🗄️ Schema recreated");
        Ok(())
    }

    pub fn list_articole_full(&self) -> RepoResult<Vec<ArticolWithReferences>> {
        Ok(self.storage.list_articole_full()?)
    }

    pub fn list_articole(&self) -> RepoResult<Vec<Articol>> {
        Ok(self.storage.list_articole()?)
    }

    pub fn get_articol(&self, articol_id: i64) -> RepoResult<Articol> {
        ensure_articol(&self.storage, articol_id)
    }

    pub fn list_references(&self) -> RepoResult<Vec<Reference>> {
        Ok(self.storage.list_references()?)
    }

    pub fn list_references_by_articol(
        &self,
        articol_id: i64,
    ) -> RepoResult<Vec<ReferenceWithArticol>> {
        let tx = self.storage.begin_read()?;
        ensure_articol(&tx, articol_id)?;
        let references = tx.list_references_by_articol(articol_id)?;
        tx.commit()?;
        Ok(references)
    }

    pub fn get_reference(
        &self,
        articol_id: i64,
        reference_id: i64,
    ) -> RepoResult<ReferenceWithArticol> {
        let tx = self.storage.begin_read()?;
        ensure_articol(&tx, articol_id)?;
        let reference = ensure_reference(&tx, articol_id, reference_id)?;
        tx.commit()?;
        Ok(reference)
    }

    pub fn filter_articole(&self, filter: &ArticolFilter) -> RepoResult<Vec<Articol>> {
        Ok(self.storage.filter_articole(filter)?)
    }

    pub fn list_articole_by_date(&self) -> RepoResult<Vec<Articol>> {
        Ok(self.storage.list_articole_by_date_desc()?)
    }

    pub fn export_full(&self, dir: &Path) -> RepoResult<PathBuf> {
        let graph = self.storage.list_articole_full()?;
        Ok(export::write_export(dir, &graph)?)
    }

    pub fn create_articol(&self, input: &ArticolInput) -> RepoResult<Articol> {
        let new = input.validate()?;
        let tx = self.storage.begin_tx()?;
        let articol = tx.insert_articol(&new)?;
        tx.commit()?;
        log::info!("➕ Created articol {}", articol.articol_id);
        Ok(articol)
    }

    pub fn create_reference(&self, articol_id: i64, input: &ReferenceInput) -> RepoResult<Reference> {
        let new = input.validate()?;
        let tx = self.storage.begin_tx()?;
        ensure_articol(&tx, articol_id)?;
        let reference = tx.insert_reference(articol_id, &new)?;
        tx.commit()?;
        log::info!(
            "➕ Created reference {} for articol {}",
            reference.reference_id,
            articol_id
        );
        Ok(reference)
    }

    pub fn update_articol(&self, articol_id: i64, patch: &ArticolPatch) -> RepoResult<Articol> {
        ensure_same_id(articol_id, patch.articol_id)?;
        let tx = self.storage.begin_tx()?;
        let current = ensure_articol(&tx, articol_id)?;
        let next = patch.apply_to(&current)?;
        let updated = tx.update_articol(&next)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn update_reference(
        &self,
        articol_id: i64,
        reference_id: i64,
        patch: &ReferencePatch,
    ) -> RepoResult<Reference> {
        ensure_same_id(reference_id, patch.reference_id)?;
        let tx = self.storage.begin_tx()?;
        ensure_articol(&tx, articol_id)?;
        let current = ensure_reference(&tx, articol_id, reference_id)?;
        let next = patch.apply_to(&current.reference)?;
        let updated = tx.update_reference(&next)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Removes an Articol. Its References follow the relation's on-delete
    /// policy: removed with it, or the delete is refused while any exist.
    pub fn delete_articol(&self, articol_id: i64) -> RepoResult<Articol> {
        let tx = self.storage.begin_tx()?;
        let articol = ensure_articol(&tx, articol_id)?;
        match self.storage.relation().on_delete {
            OnDelete::Restrict => {
                if tx.count_references(articol_id)? > 0 {
                    log::warn!("Refusing to delete articol {} with references", articol_id);
                    return Err(RepoError::ArticolHasReferences(articol_id));
                }
            }
            OnDelete::Cascade => {
                let removed = tx.delete_references_by_articol(articol_id)?;
                log::debug!("Cascade removed {} references of articol {}", removed, articol_id);
            }
        }
        tx.delete_articol(articol_id)?;
        tx.commit()?;
        log::info!("🗑️ Deleted articol {}", articol_id);
        Ok(articol)
    }

    pub fn delete_reference(&self, articol_id: i64, reference_id: i64) -> RepoResult<Reference> {
        let tx = self.storage.begin_tx()?;
        ensure_articol(&tx, articol_id)?;
        let snapshot = ensure_reference(&tx, articol_id, reference_id)?;
        tx.delete_reference(articol_id, reference_id)?;
        tx.commit()?;
        log::info!(
            "🗑️ Deleted reference {} of articol {}",
            reference_id,
            articol_id
        );
        Ok(snapshot.reference)
    }
}
