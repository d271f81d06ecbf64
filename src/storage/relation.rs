use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub key: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    OneToMany,
}

/// What happens to children when their parent row is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OnDelete {
    #[default]
    Cascade,
    Restrict,
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnDelete::Cascade => write!(f, "cascade"),
            OnDelete::Restrict => write!(f, "restrict"),
        }
    }
}

/// Parent/child wiring between two tables. Storage builds its DDL and join
/// queries from this instead of hard-coding the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relation {
    pub parent: TableDef,
    pub child: TableDef,
    pub foreign_key: &'static str,
    pub cardinality: Cardinality,
    pub on_delete: OnDelete,
}

impl Relation {
    pub const fn articol_references(on_delete: OnDelete) -> Self {
        Self {
            parent: TableDef {
                name: "articole",
                key: "articol_id",
            },
            child: TableDef {
                name: "referinte",
                key: "reference_id",
            },
            foreign_key: "articol_id",
            cardinality: Cardinality::OneToMany,
            on_delete,
        }
    }

    pub fn sql_on_delete(&self) -> &'static str {
        match self.on_delete {
            OnDelete::Cascade => "CASCADE",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

impl Default for Relation {
    fn default() -> Self {
        Self::articol_references(OnDelete::default())
    }
}
