// src/db/expense_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        expense::{
            CreateExpensePayload, Expense, ExpenseDocument, ExpenseDocumentContent, ExpenseFilter,
            ExpenseTotal, NewExpenseDocument,
        },
        storage::StoredFile,
    },
};

const COLUMNS: &str = r#"
    id, couturier_id, salon_id, type_charge, categorie, description, montant, date_charge,
    reference, commande_id, employe_id, fichier_justificatif, date_creation
"#;

const DOCUMENT_COLUMNS: &str = r#"
    id, charge_id, file_name, mime_type, file_size, file_path,
    (file_data IS NOT NULL) AS stored_inline,
    description, uploaded_by, uploaded_at
"#;

#[derive(sqlx::FromRow)]
struct DocumentRow {
    #[sqlx(flatten)]
    meta: ExpenseDocument,
    file_data: Option<Vec<u8>>,
}

#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        salon_id: &str,
        couturier_id: Uuid,
        input: &CreateExpensePayload,
        reference: &str,
    ) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO charges (
                couturier_id, salon_id, type_charge, categorie, description, montant,
                date_charge, reference, commande_id, employe_id, fichier_justificatif
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Expense>(&sql)
            .bind(couturier_id)
            .bind(salon_id)
            .bind(input.type_charge)
            .bind(input.categorie.trim())
            .bind(&input.description)
            .bind(input.montant)
            .bind(input.date_charge)
            .bind(reference)
            .bind(input.commande_id)
            .bind(input.employe_id)
            .bind(&input.fichier_justificatif)
            .fetch_one(executor)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM charges WHERE id = $1");
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(expense)
    }

    pub async fn references<'e, E>(&self, executor: E, salon_id: &str) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let refs = sqlx::query_scalar::<_, String>(
            "SELECT reference FROM charges WHERE salon_id = $1 AND reference IS NOT NULL",
        )
        .bind(salon_id)
        .fetch_all(executor)
        .await?;
        Ok(refs)
    }

    pub async fn reference_exists<'e, E>(&self, executor: E, salon_id: &str, reference: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM charges WHERE salon_id = $1 AND reference = $2)",
        )
        .bind(salon_id)
        .bind(reference)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn list(&self, salon_id: Option<&str>, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM charges
            WHERE ($1::varchar IS NULL OR salon_id = $1)
              AND ($2::date IS NULL OR date_charge >= $2)
              AND ($3::date IS NULL OR date_charge <= $3)
              AND ($4::charge_type IS NULL OR type_charge = $4)
            ORDER BY date_charge DESC, date_creation DESC
            "#
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(salon_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.type_charge)
            .fetch_all(&self.pool)
            .await?;
        Ok(expenses)
    }

    pub async fn total(&self, salon_id: Option<&str>, filter: &ExpenseFilter) -> Result<ExpenseTotal, AppError> {
        let (total, nb_charges) = sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(montant), 0), COUNT(*) FROM charges
            WHERE ($1::varchar IS NULL OR salon_id = $1)
              AND ($2::date IS NULL OR date_charge >= $2)
              AND ($3::date IS NULL OR date_charge <= $3)
              AND ($4::charge_type IS NULL OR type_charge = $4)
            "#,
        )
        .bind(salon_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.type_charge)
        .fetch_one(&self.pool)
        .await?;

        Ok(ExpenseTotal { total, nb_charges })
    }

    // --- Documentos ---

    pub async fn insert_document(
        &self,
        charge_id: Uuid,
        uploaded_by: Uuid,
        doc: NewExpenseDocument,
    ) -> Result<ExpenseDocument, AppError> {
        let file_size = doc.file.size();
        let (path, data) = doc.file.into_columns();

        let sql = format!(
            r#"
            INSERT INTO charge_documents (
                charge_id, file_name, mime_type, file_size, file_path, file_data, description, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ExpenseDocument>(&sql)
            .bind(charge_id)
            .bind(doc.file_name.trim())
            .bind(&doc.mime_type)
            .bind(file_size)
            .bind(path)
            .bind(data)
            .bind(&doc.description)
            .bind(uploaded_by)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn list_documents(&self, charge_id: Uuid) -> Result<Vec<ExpenseDocument>, AppError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM charge_documents WHERE charge_id = $1 ORDER BY uploaded_at"
        );
        let docs = sqlx::query_as::<_, ExpenseDocument>(&sql)
            .bind(charge_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<ExpenseDocumentContent>, AppError> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS}, file_data FROM charge_documents WHERE id = $1");
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| {
            let path = row.meta.file_path.clone();
            StoredFile::from_columns(path, row.file_data)
                .map(|file| ExpenseDocumentContent { meta: row.meta, file })
        }))
    }
}
