use async_trait::async_trait;
use sqlx::Row;

use common::crypto::{Address, NameHash};
use common::linked_data::Link;
use common::registry::{NameRecord, NameRegistry, NameRegistryError};

use crate::database::{types::DLink, Database};

fn decode_record(row: &sqlx::sqlite::SqliteRow) -> Result<NameRecord, sqlx::Error> {
    let address: String = row.try_get("address")?;
    let address: Address = address
        .parse()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let pointer: DLink = row.try_get("root_manifest_pointer")?;

    Ok(NameRecord {
        address,
        public_key: row.try_get("public_key")?,
        root_manifest_pointer: pointer.into(),
    })
}

#[async_trait]
impl NameRegistry for Database {
    type Error = sqlx::Error;

    async fn resolve(
        &self,
        name_hash: &NameHash,
    ) -> Result<NameRecord, NameRegistryError<Self::Error>> {
        let row = sqlx::query(
            r#"
            SELECT address, public_key, root_manifest_pointer
            FROM name_records
            WHERE name_hash = $1
            "#,
        )
        .bind(name_hash.to_hex())
        .fetch_optional(&**self)
        .await
        .map_err(NameRegistryError::Provider)?;

        match row {
            Some(row) => decode_record(&row).map_err(NameRegistryError::Provider),
            None => Err(NameRegistryError::NotFound(*name_hash)),
        }
    }

    async fn register(
        &self,
        name_hash: NameHash,
        record: NameRecord,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        let pointer: DLink = record.root_manifest_pointer.into();

        // the primary key makes this an exclusive create
        sqlx::query(
            r#"
            INSERT INTO name_records (name_hash, address, public_key, root_manifest_pointer)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(name_hash.to_hex())
        .bind(record.address.to_string())
        .bind(&record.public_key)
        .bind(pointer)
        .execute(&**self)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                NameRegistryError::AlreadyExists(name_hash)
            }
            _ => NameRegistryError::Provider(e),
        })?;

        tracing::debug!(%name_hash, "inserted name record");
        Ok(())
    }

    async fn update_pointer(
        &self,
        name_hash: &NameHash,
        old: &Link,
        new: Link,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        let old_pointer: DLink = (*old).into();
        let new_pointer: DLink = new.into();

        let result = sqlx::query(
            r#"
            UPDATE name_records
            SET root_manifest_pointer = $1, updated_at = CURRENT_TIMESTAMP
            WHERE name_hash = $2 AND root_manifest_pointer = $3
            "#,
        )
        .bind(new_pointer)
        .bind(name_hash.to_hex())
        .bind(old_pointer)
        .execute(&**self)
        .await
        .map_err(NameRegistryError::Provider)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // nothing matched: either no record or the pointer moved
        let current = self.resolve(name_hash).await?;
        Err(NameRegistryError::PointerMismatch(
            *old,
            current.root_manifest_pointer,
        ))
    }
}
