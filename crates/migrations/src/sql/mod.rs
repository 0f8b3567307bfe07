use sqlx::{Sqlite, Transaction};

pub mod m000001;
pub mod m000002;

pub struct QueueMigration {
    name: &'static str,
    pub(crate) stmts: &'static [&'static str],
}

impl QueueMigration {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Numeric id derived from the `m000NNN` name.
    pub fn migration_number(&self) -> u32 {
        self.name
            .trim_start_matches('m')
            .parse()
            .expect("Migration names follow the m000NNN pattern")
    }

    pub async fn execute<'e>(&self, tx: &mut Transaction<'e, Sqlite>) -> Result<(), sqlx::Error> {
        for stmt in self.stmts {
            sqlx::query(stmt).execute(tx.as_mut()).await?;
        }

        Ok(())
    }
}

pub const QUEUE_MIGRATIONS: &[QueueMigration] =
    &[m000001::M000001_MIGRATION, m000002::M000002_MIGRATION];
