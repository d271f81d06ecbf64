use anyhow::Result;
use chrono::Utc;
use rusqlite::{
    functions::FunctionFlags, params, params_from_iter, Connection, OptionalExtension, Row,
};
use std::path::Path;

use super::{
    relation::Relation,
    traits::{Storage, StorageRead, StorageTx, StorageWrite},
};
use crate::types::{
    Articol, ArticolFilter, ArticolTitle, ArticolWithReferences, NewArticol, NewReference,
    Reference, ReferenceWithArticol,
};

const DB_SCHEMA_VERSION: i64 = 1;

const ARTICOL_FIELDS: [&str; 6] = [
    "articol_id",
    "articol_titlu",
    "articol_rezumat",
    "articol_data",
    "created_at",
    "updated_at",
];

const REFERENCE_FIELDS: [&str; 7] = [
    "reference_id",
    "reference_titlu",
    "reference_data",
    "lista_autori",
    "articol_id",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
    relation: Relation,
}

pub struct SqliteTx {
    conn: Connection,
    relation: Relation,
}

impl StorageTx for SqliteTx {
    fn commit(self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }
}

fn columns(alias: &str, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("{alias}.{f}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_articol_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Articol> {
    Ok(Articol {
        articol_id: row.get(offset)?,
        articol_titlu: row.get(offset + 1)?,
        articol_rezumat: row.get(offset + 2)?,
        articol_data: row.get(offset + 3)?,
        created_at: row.get(offset + 4)?,
        updated_at: row.get(offset + 5)?,
    })
}

fn map_articol_row(row: &Row<'_>) -> rusqlite::Result<Articol> {
    map_articol_at(row, 0)
}

fn map_reference_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Reference> {
    Ok(Reference {
        reference_id: row.get(offset)?,
        reference_titlu: row.get(offset + 1)?,
        reference_data: row.get(offset + 2)?,
        lista_autori: row.get(offset + 3)?,
        articol_id: row.get(offset + 4)?,
        created_at: row.get(offset + 5)?,
        updated_at: row.get(offset + 6)?,
    })
}

fn map_reference_row(row: &Row<'_>) -> rusqlite::Result<Reference> {
    map_reference_at(row, 0)
}

fn map_reference_with_articol_row(row: &Row<'_>) -> rusqlite::Result<ReferenceWithArticol> {
    Ok(ReferenceWithArticol {
        reference: map_reference_at(row, 0)?,
        articol: ArticolTitle {
            articol_titlu: row.get(REFERENCE_FIELDS.len())?,
        },
    })
}

/// SQL function lowercasing its argument with full Unicode rules. The
/// built-in `LIKE` only folds ASCII.
const FOLD_FN: &str = "fold_case";

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Turns a user supplied term into a `LIKE` pattern matching it literally
/// anywhere in the column.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn db_list_articole(conn: &Connection, rel: &Relation) -> rusqlite::Result<Vec<Articol>> {
    let sql = format!(
        "SELECT {} FROM {} a ORDER BY a.{}",
        columns("a", &ARTICOL_FIELDS),
        rel.parent.name,
        rel.parent.key
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_articol_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_articole_by_date_desc(
    conn: &Connection,
    rel: &Relation,
) -> rusqlite::Result<Vec<Articol>> {
    let sql = format!(
        "SELECT {} FROM {} a ORDER BY a.articol_data DESC, a.{}",
        columns("a", &ARTICOL_FIELDS),
        rel.parent.name,
        rel.parent.key
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_articol_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_articole_full(
    conn: &Connection,
    rel: &Relation,
) -> rusqlite::Result<Vec<ArticolWithReferences>> {
    let sql = format!(
        r#"
        SELECT {}, {}
        FROM {parent} a
        LEFT OUTER JOIN {child} r ON r.{fk} = a.{parent_key}
        ORDER BY a.{parent_key}, r.{child_key}
        "#,
        columns("a", &ARTICOL_FIELDS),
        columns("r", &REFERENCE_FIELDS),
        parent = rel.parent.name,
        child = rel.child.name,
        fk = rel.foreign_key,
        parent_key = rel.parent.key,
        child_key = rel.child.key,
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;

    let mut out: Vec<ArticolWithReferences> = Vec::new();
    while let Some(row) = rows.next()? {
        let articol_id: i64 = row.get(0)?;
        if out.last().map(|a| a.articol.articol_id) != Some(articol_id) {
            out.push(ArticolWithReferences {
                articol: map_articol_at(row, 0)?,
                references: Vec::new(),
            });
        }
        let reference_id: Option<i64> = row.get(ARTICOL_FIELDS.len())?;
        if reference_id.is_some() {
            let reference = map_reference_at(row, ARTICOL_FIELDS.len())?;
            if let Some(last) = out.last_mut() {
                last.references.push(reference);
            }
        }
    }
    Ok(out)
}

fn db_filter_articole(
    conn: &Connection,
    rel: &Relation,
    filter: &ArticolFilter,
) -> rusqlite::Result<Vec<Articol>> {
    let mut clauses = Vec::new();
    let mut args = Vec::new();
    if let Some(titlu) = filter.titlu() {
        args.push(like_pattern(&titlu.to_lowercase()));
        clauses.push(format!(
            "{FOLD_FN}(a.articol_titlu) LIKE ?{} ESCAPE '\\'",
            args.len()
        ));
    }
    if let Some(rezumat) = filter.rezumat() {
        args.push(like_pattern(&rezumat.to_lowercase()));
        clauses.push(format!(
            "{FOLD_FN}(a.articol_rezumat) LIKE ?{} ESCAPE '\\'",
            args.len()
        ));
    }
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let sql = format!(
        "SELECT {} FROM {} a {} ORDER BY a.{}",
        columns("a", &ARTICOL_FIELDS),
        rel.parent.name,
        where_clause,
        rel.parent.key
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), map_articol_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_get_articol(conn: &Connection, rel: &Relation, articol_id: i64) -> rusqlite::Result<Articol> {
    let sql = format!(
        "SELECT {} FROM {} a WHERE a.{} = ?1",
        columns("a", &ARTICOL_FIELDS),
        rel.parent.name,
        rel.parent.key
    );
    conn.query_row(&sql, params![articol_id], map_articol_row)
}

fn db_load_articol(
    conn: &Connection,
    rel: &Relation,
    articol_id: i64,
) -> rusqlite::Result<Option<Articol>> {
    db_get_articol(conn, rel, articol_id).optional()
}

fn db_list_references(conn: &Connection, rel: &Relation) -> rusqlite::Result<Vec<Reference>> {
    let sql = format!(
        "SELECT {} FROM {} r ORDER BY r.{}",
        columns("r", &REFERENCE_FIELDS),
        rel.child.name,
        rel.child.key
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_reference_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn reference_with_articol_sql(rel: &Relation, extra_where: &str) -> String {
    format!(
        r#"
        SELECT {}, a.articol_titlu
        FROM {child} r
        INNER JOIN {parent} a ON a.{parent_key} = r.{fk}
        WHERE r.{fk} = ?1 {extra_where}
        ORDER BY r.{child_key}
        "#,
        columns("r", &REFERENCE_FIELDS),
        parent = rel.parent.name,
        child = rel.child.name,
        fk = rel.foreign_key,
        parent_key = rel.parent.key,
        child_key = rel.child.key,
    )
}

fn db_list_references_by_articol(
    conn: &Connection,
    rel: &Relation,
    articol_id: i64,
) -> rusqlite::Result<Vec<ReferenceWithArticol>> {
    let sql = reference_with_articol_sql(rel, "");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![articol_id], map_reference_with_articol_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_load_reference(
    conn: &Connection,
    rel: &Relation,
    articol_id: i64,
    reference_id: i64,
) -> rusqlite::Result<Option<ReferenceWithArticol>> {
    let sql = reference_with_articol_sql(rel, &format!("AND r.{} = ?2", rel.child.key));
    conn.query_row(
        &sql,
        params![articol_id, reference_id],
        map_reference_with_articol_row,
    )
    .optional()
}

fn db_get_reference(
    conn: &Connection,
    rel: &Relation,
    reference_id: i64,
) -> rusqlite::Result<Reference> {
    let sql = format!(
        "SELECT {} FROM {} r WHERE r.{} = ?1",
        columns("r", &REFERENCE_FIELDS),
        rel.child.name,
        rel.child.key
    );
    conn.query_row(&sql, params![reference_id], map_reference_row)
}

fn db_count_references(conn: &Connection, rel: &Relation, articol_id: i64) -> rusqlite::Result<u64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?1",
        rel.child.name, rel.foreign_key
    );
    let count: i64 = conn.query_row(&sql, params![articol_id], |row| row.get(0))?;
    Ok(count as u64)
}

fn db_insert_articol(
    conn: &Connection,
    rel: &Relation,
    articol: &NewArticol,
) -> rusqlite::Result<Articol> {
    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO {} (articol_titlu, articol_rezumat, articol_data, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        "#,
        rel.parent.name
    );
    conn.execute(
        &sql,
        params![articol.titlu, articol.rezumat, articol.data, now],
    )?;
    db_get_articol(conn, rel, conn.last_insert_rowid())
}

fn db_update_articol(
    conn: &Connection,
    rel: &Relation,
    articol: &Articol,
) -> rusqlite::Result<Articol> {
    let sql = format!(
        r#"
        UPDATE {}
        SET articol_titlu = ?1,
            articol_rezumat = ?2,
            articol_data = ?3,
            updated_at = ?4
        WHERE {} = ?5
        "#,
        rel.parent.name, rel.parent.key
    );
    conn.execute(
        &sql,
        params![
            articol.articol_titlu,
            articol.articol_rezumat,
            articol.articol_data,
            Utc::now(),
            articol.articol_id
        ],
    )?;
    db_get_articol(conn, rel, articol.articol_id)
}

fn db_delete_articol(conn: &Connection, rel: &Relation, articol_id: i64) -> rusqlite::Result<usize> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", rel.parent.name, rel.parent.key);
    conn.execute(&sql, params![articol_id])
}

fn db_insert_reference(
    conn: &Connection,
    rel: &Relation,
    articol_id: i64,
    reference: &NewReference,
) -> rusqlite::Result<Reference> {
    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO {} (reference_titlu, reference_data, lista_autori, {}, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        "#,
        rel.child.name, rel.foreign_key
    );
    conn.execute(
        &sql,
        params![
            reference.titlu,
            reference.data,
            reference.lista_autori,
            articol_id,
            now
        ],
    )?;
    db_get_reference(conn, rel, conn.last_insert_rowid())
}

fn db_update_reference(
    conn: &Connection,
    rel: &Relation,
    reference: &Reference,
) -> rusqlite::Result<Reference> {
    let sql = format!(
        r#"
        UPDATE {}
        SET reference_titlu = ?1,
            reference_data = ?2,
            lista_autori = ?3,
            updated_at = ?4
        WHERE {} = ?5 AND {} = ?6
        "#,
        rel.child.name, rel.child.key, rel.foreign_key
    );
    conn.execute(
        &sql,
        params![
            reference.reference_titlu,
            reference.reference_data,
            reference.lista_autori,
            Utc::now(),
            reference.reference_id,
            reference.articol_id
        ],
    )?;
    db_get_reference(conn, rel, reference.reference_id)
}

fn db_delete_reference(
    conn: &Connection,
    rel: &Relation,
    articol_id: i64,
    reference_id: i64,
) -> rusqlite::Result<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
        rel.child.name, rel.foreign_key, rel.child.key
    );
    conn.execute(&sql, params![articol_id, reference_id])
}

fn db_delete_references_by_articol(
    conn: &Connection,
    rel: &Relation,
    articol_id: i64,
) -> rusqlite::Result<usize> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", rel.child.name, rel.foreign_key);
    conn.execute(&sql, params![articol_id])
}

impl StorageRead for SqliteTx {
    fn list_articole(&self) -> Result<Vec<Articol>> {
        Ok(db_list_articole(&self.conn, &self.relation)?)
    }

    fn list_articole_full(&self) -> Result<Vec<ArticolWithReferences>> {
        Ok(db_list_articole_full(&self.conn, &self.relation)?)
    }

    fn list_articole_by_date_desc(&self) -> Result<Vec<Articol>> {
        Ok(db_list_articole_by_date_desc(&self.conn, &self.relation)?)
    }

    fn filter_articole(&self, filter: &ArticolFilter) -> Result<Vec<Articol>> {
        Ok(db_filter_articole(&self.conn, &self.relation, filter)?)
    }

    fn load_articol(&self, articol_id: i64) -> Result<Option<Articol>> {
        Ok(db_load_articol(&self.conn, &self.relation, articol_id)?)
    }

    fn list_references(&self) -> Result<Vec<Reference>> {
        Ok(db_list_references(&self.conn, &self.relation)?)
    }

    fn list_references_by_articol(&self, articol_id: i64) -> Result<Vec<ReferenceWithArticol>> {
        Ok(db_list_references_by_articol(
            &self.conn,
            &self.relation,
            articol_id,
        )?)
    }

    fn load_reference(
        &self,
        articol_id: i64,
        reference_id: i64,
    ) -> Result<Option<ReferenceWithArticol>> {
        Ok(db_load_reference(
            &self.conn,
            &self.relation,
            articol_id,
            reference_id,
        )?)
    }

    fn count_references(&self, articol_id: i64) -> Result<u64> {
        Ok(db_count_references(&self.conn, &self.relation, articol_id)?)
    }
}

impl StorageWrite for SqliteTx {
    fn insert_articol(&self, articol: &NewArticol) -> Result<Articol> {
        Ok(db_insert_articol(&self.conn, &self.relation, articol)?)
    }

    fn update_articol(&self, articol: &Articol) -> Result<Articol> {
        Ok(db_update_articol(&self.conn, &self.relation, articol)?)
    }

    fn delete_articol(&self, articol_id: i64) -> Result<usize> {
        Ok(db_delete_articol(&self.conn, &self.relation, articol_id)?)
    }

    fn insert_reference(&self, articol_id: i64, reference: &NewReference) -> Result<Reference> {
        Ok(db_insert_reference(
            &self.conn,
            &self.relation,
            articol_id,
            reference,
        )?)
    }

    fn update_reference(&self, reference: &Reference) -> Result<Reference> {
        Ok(db_update_reference(&self.conn, &self.relation, reference)?)
    }

    fn delete_reference(&self, articol_id: i64, reference_id: i64) -> Result<usize> {
        Ok(db_delete_reference(
            &self.conn,
            &self.relation,
            articol_id,
            reference_id,
        )?)
    }

    fn delete_references_by_articol(&self, articol_id: i64) -> Result<usize> {
        Ok(db_delete_references_by_articol(
            &self.conn,
            &self.relation,
            articol_id,
        )?)
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn relation(&self) -> &Relation {
        &self.relation
    }

    fn begin_tx(&self) -> Result<Self::Tx> {
        self.begin("BEGIN IMMEDIATE")
    }

    fn begin_read(&self) -> Result<Self::Tx> {
        self.begin("BEGIN DEFERRED")
    }

    fn recreate_schema(&self) -> Result<()> {
        let conn = Self::open(&self.path)?;
        log::warn!(
            "Dropping tables {} and {}",
            self.relation.child.name,
            self.relation.parent.name
        );
        conn.execute_batch(&format!(
            r#"
            DROP TABLE IF EXISTS {};
            DROP TABLE IF EXISTS {};
            PRAGMA user_version = 0;
            "#,
            self.relation.child.name, self.relation.parent.name
        ))?;
        Self::migrate(&conn, &self.relation)?;
        Ok(())
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P, relation: Relation) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            relation,
        }
    }

    /// Deletes the database file together with its WAL sidecars.
    pub fn reset_all(&self) -> Result<()> {
        for suffix in ["", "-wal", "-shm"] {
            let path = format!("{}{}", self.path, suffix);
            if Path::new(&path).exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn begin(&self, statement: &str) -> Result<SqliteTx> {
        let conn = Self::open(&self.path)?;
        Self::migrate(&conn, &self.relation)?;
        conn.execute(statement, [])?;

        Ok(SqliteTx {
            conn,
            relation: self.relation,
        })
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn open(path: &str) -> rusqlite::Result<Connection> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;
        register_functions(&conn)?;
        Ok(conn)
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = Self::open(&self.path)?;
        Self::migrate(&conn, &self.relation)?;
        f(&conn)
    }

    fn migrate(conn: &Connection, rel: &Relation) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        if version == 0 {
            log::info!(
                "SQLite schema migration: {} -> {}",
                version,
                DB_SCHEMA_VERSION
            );
            conn.execute_batch(&format!(
                r#"
            CREATE TABLE IF NOT EXISTS {parent} (
                {parent_key} INTEGER PRIMARY KEY AUTOINCREMENT,
                articol_titlu TEXT NOT NULL,
                articol_rezumat TEXT NOT NULL,
                articol_data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {child} (
                {child_key} INTEGER PRIMARY KEY AUTOINCREMENT,
                reference_titlu TEXT NOT NULL,
                reference_data TEXT NOT NULL,
                lista_autori TEXT NOT NULL,
                {fk} INTEGER NOT NULL
                    REFERENCES {parent}({parent_key}) ON DELETE {on_delete},
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {child}_{fk}_idx ON {child}({fk});
            "#,
                parent = rel.parent.name,
                parent_key = rel.parent.key,
                child = rel.child.name,
                child_key = rel.child.key,
                fk = rel.foreign_key,
                on_delete = rel.sql_on_delete(),
            ))?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}

impl StorageRead for SqliteStorage {
    fn list_articole(&self) -> Result<Vec<Articol>> {
        let rows = self.with_conn(|conn| db_list_articole(conn, &self.relation))?;
        Ok(rows)
    }

    fn list_articole_full(&self) -> Result<Vec<ArticolWithReferences>> {
        let rows = self.with_conn(|conn| db_list_articole_full(conn, &self.relation))?;
        Ok(rows)
    }

    fn list_articole_by_date_desc(&self) -> Result<Vec<Articol>> {
        let rows = self.with_conn(|conn| db_list_articole_by_date_desc(conn, &self.relation))?;
        Ok(rows)
    }

    fn filter_articole(&self, filter: &ArticolFilter) -> Result<Vec<Articol>> {
        let rows = self.with_conn(|conn| db_filter_articole(conn, &self.relation, filter))?;
        Ok(rows)
    }

    fn load_articol(&self, articol_id: i64) -> Result<Option<Articol>> {
        let row = self.with_conn(|conn| db_load_articol(conn, &self.relation, articol_id))?;
        Ok(row)
    }

    fn list_references(&self) -> Result<Vec<Reference>> {
        let rows = self.with_conn(|conn| db_list_references(conn, &self.relation))?;
        Ok(rows)
    }

    fn list_references_by_articol(&self, articol_id: i64) -> Result<Vec<ReferenceWithArticol>> {
        let rows = self
            .with_conn(|conn| db_list_references_by_articol(conn, &self.relation, articol_id))?;
        Ok(rows)
    }

    fn load_reference(
        &self,
        articol_id: i64,
        reference_id: i64,
    ) -> Result<Option<ReferenceWithArticol>> {
        let row = self.with_conn(|conn| {
            db_load_reference(conn, &self.relation, articol_id, reference_id)
        })?;
        Ok(row)
    }

    fn count_references(&self, articol_id: i64) -> Result<u64> {
        let count = self.with_conn(|conn| db_count_references(conn, &self.relation, articol_id))?;
        Ok(count)
    }
}
