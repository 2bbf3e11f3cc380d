//! Postgres-backed dropdown store.
//!
//! Table and column identifiers come from the static column registry only.
//! Tenant ids and row values are always bound parameters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};

use crate::audit::{Audited, SealedChanges};
use crate::dropdowns::errors::DropdownError;
use crate::dropdowns::records::{LookupRecord, QualificationRecord};
use crate::dropdowns::store::DropdownStore;
use crate::dropdowns::sync::{plan_replace, SyncReport};
use crate::dropdowns::tables::{Column, ColumnMapping};
use crate::dropdowns::tenant::TenantScope;

#[derive(Debug, Clone)]
pub struct PgDropdownStore {
    pool: PgPool,
}

impl PgDropdownStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sub_columns(mapping: &ColumnMapping) -> Result<(Column, Column), DropdownError> {
    mapping
        .sub
        .ok_or(DropdownError::RecordShapeMismatch(mapping.table.public_name()))
}

fn read_scope(row: &PgRow) -> Result<TenantScope, sqlx::Error> {
    Ok(TenantScope::stored(row.try_get::<Option<String>, _>("company_id")?))
}

fn read_lookup(row: &PgRow, mapping: &ColumnMapping) -> Result<LookupRecord, sqlx::Error> {
    Ok(LookupRecord {
        code: row.try_get(mapping.code.column)?,
        company_id: read_scope(row)?,
        name: row.try_get(mapping.name.column)?,
    })
}

fn read_qualification(
    row: &PgRow,
    mapping: &ColumnMapping,
    sub: (Column, Column),
) -> Result<QualificationRecord, sqlx::Error> {
    Ok(QualificationRecord {
        code: row.try_get(mapping.code.column)?,
        sub_code: row.try_get(sub.0.column)?,
        company_id: read_scope(row)?,
        name: row.try_get(mapping.name.column)?,
        sub_name: row.try_get(sub.1.column)?,
    })
}

fn read_audited<T>(row: &PgRow, record: T) -> Result<Audited<T>, sqlx::Error> {
    Ok(Audited::stored(
        record,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Single-level tables
// ────────────────────────────────────────────────────────────────────────────

async fn load_lookup_scope(
    tx: &mut Transaction<'_, Postgres>,
    mapping: &ColumnMapping,
    scope: &TenantScope,
) -> Result<Vec<Audited<LookupRecord>>, sqlx::Error> {
    let sql = format!(
        "SELECT {code}, {name}, company_id, created_at, updated_at FROM {table} \
         WHERE company_id IS NOT DISTINCT FROM $1",
        code = mapping.code.column,
        name = mapping.name.column,
        table = mapping.table.storage_table(),
    );

    let rows = sqlx::query(&sql)
        .bind(scope.company_id())
        .fetch_all(&mut **tx)
        .await?;

    rows.iter()
        .map(|row| read_audited(row, read_lookup(row, mapping)?))
        .collect()
}

async fn write_lookup_changes(
    tx: &mut Transaction<'_, Postgres>,
    mapping: &ColumnMapping,
    scope: &TenantScope,
    sealed: &SealedChanges<Audited<LookupRecord>>,
) -> Result<(), sqlx::Error> {
    let table = mapping.table.storage_table();
    let code = mapping.code.column;
    let name = mapping.name.column;

    let insert = format!(
        "INSERT INTO {table} ({code}, company_id, {name}, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5)"
    );
    for row in &sealed.created {
        sqlx::query(&insert)
            .bind(&row.record.code)
            .bind(scope.company_id())
            .bind(&row.record.name)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&mut **tx)
            .await?;
    }

    let update = format!(
        "UPDATE {table} SET {name} = $1, updated_at = $2 \
         WHERE {code} = $3 AND company_id IS NOT DISTINCT FROM $4"
    );
    for row in &sealed.modified {
        sqlx::query(&update)
            .bind(&row.record.name)
            .bind(row.updated_at)
            .bind(&row.record.code)
            .bind(scope.company_id())
            .execute(&mut **tx)
            .await?;
    }

    let delete =
        format!("DELETE FROM {table} WHERE {code} = $1 AND company_id IS NOT DISTINCT FROM $2");
    for row in &sealed.deleted {
        sqlx::query(&delete)
            .bind(&row.record.code)
            .bind(scope.company_id())
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Qualification table
// ────────────────────────────────────────────────────────────────────────────

async fn load_qualification_scope(
    tx: &mut Transaction<'_, Postgres>,
    mapping: &ColumnMapping,
    sub: (Column, Column),
    scope: &TenantScope,
) -> Result<Vec<Audited<QualificationRecord>>, sqlx::Error> {
    let sql = format!(
        "SELECT {code}, {sub_code}, {name}, {sub_name}, company_id, created_at, updated_at \
         FROM {table} WHERE company_id IS NOT DISTINCT FROM $1",
        code = mapping.code.column,
        sub_code = sub.0.column,
        name = mapping.name.column,
        sub_name = sub.1.column,
        table = mapping.table.storage_table(),
    );

    let rows = sqlx::query(&sql)
        .bind(scope.company_id())
        .fetch_all(&mut **tx)
        .await?;

    rows.iter()
        .map(|row| read_audited(row, read_qualification(row, mapping, sub)?))
        .collect()
}

async fn write_qualification_changes(
    tx: &mut Transaction<'_, Postgres>,
    mapping: &ColumnMapping,
    sub: (Column, Column),
    scope: &TenantScope,
    sealed: &SealedChanges<Audited<QualificationRecord>>,
) -> Result<(), sqlx::Error> {
    let table = mapping.table.storage_table();
    let code = mapping.code.column;
    let name = mapping.name.column;
    let sub_code = sub.0.column;
    let sub_name = sub.1.column;

    let insert = format!(
        "INSERT INTO {table} ({code}, {sub_code}, company_id, {name}, {sub_name}, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)"
    );
    for row in &sealed.created {
        sqlx::query(&insert)
            .bind(&row.record.code)
            .bind(&row.record.sub_code)
            .bind(scope.company_id())
            .bind(&row.record.name)
            .bind(&row.record.sub_name)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&mut **tx)
            .await?;
    }

    let update = format!(
        "UPDATE {table} SET {name} = $1, {sub_name} = $2, updated_at = $3 \
         WHERE {code} = $4 AND {sub_code} = $5 AND company_id IS NOT DISTINCT FROM $6"
    );
    for row in &sealed.modified {
        sqlx::query(&update)
            .bind(&row.record.name)
            .bind(&row.record.sub_name)
            .bind(row.updated_at)
            .bind(&row.record.code)
            .bind(&row.record.sub_code)
            .bind(scope.company_id())
            .execute(&mut **tx)
            .await?;
    }

    let delete = format!(
        "DELETE FROM {table} \
         WHERE {code} = $1 AND {sub_code} = $2 AND company_id IS NOT DISTINCT FROM $3"
    );
    for row in &sealed.deleted {
        sqlx::query(&delete)
            .bind(&row.record.code)
            .bind(&row.record.sub_code)
            .bind(scope.company_id())
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl DropdownStore for PgDropdownStore {
    async fn sync_lookups(
        &self,
        mapping: &'static ColumnMapping,
        scope: &TenantScope,
        incoming: Vec<LookupRecord>,
    ) -> Result<SyncReport, DropdownError> {
        let mut tx = self.pool.begin().await?;

        let existing = load_lookup_scope(&mut tx, mapping, scope).await?;
        debug!(
            "Loaded {} existing rows from {} for {scope}",
            existing.len(),
            mapping.table
        );

        let plan = plan_replace(existing, incoming);
        let unchanged = plan.unchanged.len();
        let sealed = plan.changes.seal(Utc::now());

        write_lookup_changes(&mut tx, mapping, scope, &sealed).await?;
        tx.commit().await?;

        let report = SyncReport::new(mapping.table, scope.clone(), &sealed, unchanged);
        info!(
            "Replaced {} for {scope}: {} inserted, {} updated, {} deleted",
            mapping.table, report.inserted, report.updated, report.deleted
        );
        Ok(report)
    }

    async fn sync_qualifications(
        &self,
        mapping: &'static ColumnMapping,
        scope: &TenantScope,
        incoming: Vec<QualificationRecord>,
    ) -> Result<SyncReport, DropdownError> {
        let sub = sub_columns(mapping)?;
        let mut tx = self.pool.begin().await?;

        let existing = load_qualification_scope(&mut tx, mapping, sub, scope).await?;
        debug!(
            "Loaded {} existing rows from {} for {scope}",
            existing.len(),
            mapping.table
        );

        let plan = plan_replace(existing, incoming);
        let unchanged = plan.unchanged.len();
        let sealed = plan.changes.seal(Utc::now());

        write_qualification_changes(&mut tx, mapping, sub, scope, &sealed).await?;
        tx.commit().await?;

        let report = SyncReport::new(mapping.table, scope.clone(), &sealed, unchanged);
        info!(
            "Replaced {} for {scope}: {} inserted, {} updated, {} deleted",
            mapping.table, report.inserted, report.updated, report.deleted
        );
        Ok(report)
    }

    async fn list_visible_lookups(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
    ) -> Result<Vec<LookupRecord>, DropdownError> {
        // $1 NULL matches only global rows.
        let sql = format!(
            "SELECT {code}, {name}, company_id FROM {table} \
             WHERE company_id = $1 OR company_id IS NULL",
            code = mapping.code.column,
            name = mapping.name.column,
            table = mapping.table.storage_table(),
        );

        let rows = sqlx::query(&sql)
            .bind(tenant.company_id())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| read_lookup(row, mapping))
            .collect::<Result<_, _>>()?)
    }

    async fn list_visible_qualifications(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
        main_code: Option<&str>,
    ) -> Result<Vec<QualificationRecord>, DropdownError> {
        let sub = sub_columns(mapping)?;
        let sql = format!(
            "SELECT {code}, {sub_code}, {name}, {sub_name}, company_id FROM {table} \
             WHERE (company_id = $1 OR company_id IS NULL) \
             AND ($2::TEXT IS NULL OR {code} = $2)",
            code = mapping.code.column,
            sub_code = sub.0.column,
            name = mapping.name.column,
            sub_name = sub.1.column,
            table = mapping.table.storage_table(),
        );

        let rows = sqlx::query(&sql)
            .bind(tenant.company_id())
            .bind(main_code)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| read_qualification(row, mapping, sub))
            .collect::<Result<_, _>>()?)
    }

    async fn last_updated(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
    ) -> Result<Option<DateTime<Utc>>, DropdownError> {
        let sql = format!(
            "SELECT MAX(updated_at) FROM {table} WHERE company_id = $1 OR company_id IS NULL",
            table = mapping.table.storage_table(),
        );

        Ok(sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&sql)
            .bind(tenant.company_id())
            .fetch_one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;
    use crate::companies::repository::create_company;
    use crate::dropdowns::records::{DropdownOption, QualificationSubOption, ReplaceBatch};
    use crate::dropdowns::tables::{LookupTable, COLUMN_MAPPINGS};
    use crate::dropdowns::DropdownService;
    use crate::errors::AppError;
    use crate::test::db::TestDb;

    fn acme() -> TenantScope {
        TenantScope::company("ACME")
    }

    fn other() -> TenantScope {
        TenantScope::company("OTHER")
    }

    fn flat(scope: &TenantScope, rows: &[(&str, &str)]) -> ReplaceBatch {
        ReplaceBatch::Flat(
            rows.iter()
                .map(|(code, name)| LookupRecord::new(*code, scope.clone(), *name))
                .collect(),
        )
    }

    fn qualifications(scope: &TenantScope, rows: &[(&str, &str, &str, &str)]) -> ReplaceBatch {
        ReplaceBatch::Qualification(
            rows.iter()
                .map(|(code, name, sub_code, sub_name)| {
                    QualificationRecord::new(*code, *sub_code, scope.clone(), *name, *sub_name)
                })
                .collect(),
        )
    }

    fn option(code: &str, name: &str) -> DropdownOption {
        DropdownOption {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    async fn setup() -> Option<(TestDb, PgDropdownStore, DropdownService)> {
        let db = TestDb::new().await?;
        for id in ["ACME", "OTHER"] {
            create_company(&db.pool, id, id).await.unwrap();
        }
        let store = PgDropdownStore::new(db.pool.clone());
        let service = DropdownService::new(Arc::new(store.clone()));
        Some((db, store, service))
    }

    async fn codes_owned_by(
        store: &PgDropdownStore,
        table: LookupTable,
        scope: &TenantScope,
    ) -> Vec<String> {
        let mapping = COLUMN_MAPPINGS.mapping(table).unwrap();
        let mut tx = store.pool.begin().await.unwrap();
        let rows = load_lookup_scope(&mut tx, mapping, scope).await.unwrap();
        let mut codes: Vec<_> = rows.into_iter().map(|row| row.record.code).collect();
        codes.sort();
        codes
    }

    #[tokio::test]
    async fn test_pg_replace_converges_and_is_idempotent() {
        let Some((db, store, service)) = setup().await else {
            return;
        };

        let batch = flat(&acme(), &[("MY", "Malay"), ("CN", "Chinese")]);
        let first = service
            .replace_all("race_codes", &acme(), batch.clone())
            .await
            .unwrap();
        assert_eq!(first.inserted, 2);

        let second = service.replace_all("race_codes", &acme(), batch).await.unwrap();
        assert_eq!(second.rows_changed(), 0);
        assert_eq!(second.unchanged, 2);

        let third = service
            .replace_all(
                "race_codes",
                &acme(),
                flat(&acme(), &[("CN", "Chinese (Han)"), ("IN", "Indian")]),
            )
            .await
            .unwrap();
        assert_eq!((third.inserted, third.updated, third.deleted), (1, 1, 1));
        assert_eq!(
            codes_owned_by(&store, LookupTable::Race, &acme()).await,
            vec!["CN", "IN"]
        );

        db.cleanup().await;
    }

    #[tokio::test]
    async fn test_pg_scopes_are_isolated_and_wipeable() {
        let Some((db, store, service)) = setup().await else {
            return;
        };

        let global = TenantScope::global();
        service
            .replace_all("race_codes", &global, flat(&global, &[("MY", "Malay")]))
            .await
            .unwrap();
        service
            .replace_all("race_codes", &acme(), flat(&acme(), &[("CN", "Chinese")]))
            .await
            .unwrap();
        service
            .replace_all("race_codes", &other(), flat(&other(), &[("IN", "Indian")]))
            .await
            .unwrap();

        let wiped = service
            .replace_all("race_codes", &acme(), ReplaceBatch::Flat(Vec::new()))
            .await
            .unwrap();
        assert_eq!(wiped.deleted, 1);

        assert!(codes_owned_by(&store, LookupTable::Race, &acme()).await.is_empty());
        assert_eq!(codes_owned_by(&store, LookupTable::Race, &global).await, vec!["MY"]);
        assert_eq!(codes_owned_by(&store, LookupTable::Race, &other()).await, vec!["IN"]);

        db.cleanup().await;
    }

    #[tokio::test]
    async fn test_pg_reads_fall_back_to_global_rows() {
        let Some((db, _store, service)) = setup().await else {
            return;
        };

        let global = TenantScope::global();
        service
            .replace_all("salutation", &global, flat(&global, &[("MR", "Mister")]))
            .await
            .unwrap();
        service
            .replace_all("salutation", &acme(), flat(&acme(), &[("DR", "Doctor")]))
            .await
            .unwrap();

        assert_eq!(
            service.get_options("salutation", &acme()).await.unwrap(),
            vec![option("DR", "Doctor"), option("MR", "Mister")]
        );
        assert_eq!(
            service.get_options("salutation", &other()).await.unwrap(),
            vec![option("MR", "Mister")]
        );
        assert_eq!(
            service.get_options("salutation", &global).await.unwrap(),
            vec![option("MR", "Mister")]
        );

        db.cleanup().await;
    }

    #[tokio::test]
    async fn test_pg_qualification_sub_options_filter_by_main_code() {
        let Some((db, _store, service)) = setup().await else {
            return;
        };

        let global = TenantScope::global();
        service
            .replace_all(
                "qualification_codes",
                &global,
                qualifications(&global, &[("DEG", "Degree", "BSC", "Bachelor of Science")]),
            )
            .await
            .unwrap();
        service
            .replace_all(
                "qualification_codes",
                &acme(),
                qualifications(
                    &acme(),
                    &[
                        ("DEG", "Degree", "MSC", "Master of Science"),
                        ("DIP", "Diploma", "ENG", "Engineering"),
                    ],
                ),
            )
            .await
            .unwrap();

        let subs = service
            .get_qualification_sub_options("DEG", &acme())
            .await
            .unwrap();
        let sub_codes: Vec<_> = subs.iter().map(|s| s.sub_code.as_str()).collect();
        assert_eq!(sub_codes, vec!["BSC", "MSC"]);

        assert_eq!(
            service
                .get_qualification_sub_options("DEG", &other())
                .await
                .unwrap(),
            vec![QualificationSubOption {
                sub_code: "BSC".to_string(),
                sub_name: "Bachelor of Science".to_string(),
            }]
        );

        assert_eq!(
            service.get_options("qualification_codes", &acme()).await.unwrap(),
            vec![option("DEG", "Degree"), option("DIP", "Diploma")]
        );

        db.cleanup().await;
    }

    #[tokio::test]
    async fn test_pg_last_updated_covers_visible_rows() {
        let Some((db, _store, service)) = setup().await else {
            return;
        };

        assert_eq!(service.get_last_updated("hobby_codes", &acme()).await.unwrap(), None);

        let global = TenantScope::global();
        service
            .replace_all("hobby_codes", &global, flat(&global, &[("READ", "Reading")]))
            .await
            .unwrap();

        let seen_by_acme = service.get_last_updated("hobby_codes", &acme()).await.unwrap();
        let seen_globally = service.get_last_updated("hobby_codes", &global).await.unwrap();
        assert!(seen_by_acme.is_some());
        assert_eq!(seen_by_acme, seen_globally);

        db.cleanup().await;
    }

    #[tokio::test]
    async fn test_pg_unknown_company_is_unprocessable() {
        let Some((db, _store, service)) = setup().await else {
            return;
        };

        let missing = TenantScope::company("NOPE");
        let err = service
            .replace_all("race_codes", &missing, flat(&missing, &[("MY", "Malay")]))
            .await
            .unwrap_err();
        let DropdownError::Storage(inner) = &err else {
            panic!("expected a storage error, got {err:?}");
        };
        assert_eq!(
            inner.as_database_error().and_then(|e| e.constraint()),
            Some("race_codes_company_id_fkey")
        );

        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        db.cleanup().await;
    }
}
