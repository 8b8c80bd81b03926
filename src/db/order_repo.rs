// src/db/order_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        order::{status, Balance, NewOrder, Order, OrderFile, OrderFilter, OrderImageKind},
        storage::StoredFile,
    },
};

// Os bytes das imagens e do PDF nunca entram na listagem, só os indicadores
const COLUMNS: &str = r#"
    id, client_id, couturier_id, salon_id, categorie, sexe, modele, mesures,
    prix_total, avance, reste, date_livraison, statut, est_ouverte,
    model_type, fabric_image_name, model_image_name, pdf_name,
    (fabric_image IS NOT NULL OR fabric_image_path IS NOT NULL) AS has_fabric_image,
    (model_image IS NOT NULL OR model_image_path IS NOT NULL) AS has_model_image,
    (pdf_data IS NOT NULL OR pdf_path IS NOT NULL) AS has_pdf,
    date_creation, date_dernier_paiement
"#;

#[derive(sqlx::FromRow)]
struct FileRow {
    name: Option<String>,
    path: Option<String>,
    data: Option<Vec<u8>>,
}

impl FileRow {
    fn into_file(self) -> Option<OrderFile> {
        StoredFile::from_columns(self.path, self.data).map(|file| OrderFile { name: self.name, file })
    }
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, new: &NewOrder) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (fabric_path, fabric_data, fabric_name) = split_image(new.fabric_image.clone());
        let (model_path, model_data, model_name) = split_image(new.model_image.clone());

        let sql = format!(
            r#"
            INSERT INTO commandes (
                client_id, couturier_id, salon_id, categorie, sexe, modele, mesures,
                prix_total, avance, reste, date_livraison, statut, est_ouverte, model_type,
                fabric_image_path, fabric_image, fabric_image_name,
                model_image_path, model_image, model_image_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, TRUE, $13,
                    $14, $15, $16, $17, $18, $19)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Order>(&sql)
            .bind(new.client_id)
            .bind(new.couturier_id)
            .bind(&new.salon_id)
            .bind(&new.categorie)
            .bind(&new.sexe)
            .bind(&new.modele)
            .bind(Json(&new.mesures))
            .bind(new.balance.prix_total)
            .bind(new.balance.avance)
            .bind(new.balance.reste)
            .bind(new.date_livraison)
            .bind(status::EN_COURS)
            .bind(&new.model_type)
            .bind(fabric_path)
            .bind(fabric_data)
            .bind(fabric_name)
            .bind(model_path)
            .bind(model_data)
            .bind(model_name)
            .fetch_one(executor)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM commandes WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Lê a commande com `FOR UPDATE`. Toda mutação de saldo ou status
    /// passa por aqui dentro de uma transação.
    pub async fn lock<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM commandes WHERE id = $1 FOR UPDATE");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Grava saldo e status juntos. `est_ouverte` acompanha o status.
    pub async fn update_state<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        balance: &Balance,
        statut: &str,
        paid: bool,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE commandes SET
                prix_total = $2,
                avance = $3,
                reste = $4,
                statut = $5,
                est_ouverte = $6,
                date_dernier_paiement = CASE WHEN $7 THEN NOW() ELSE date_dernier_paiement END
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(balance.prix_total)
            .bind(balance.avance)
            .bind(balance.reste)
            .bind(statut)
            .bind(status::is_open(statut))
            .bind(paid)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("commande {id}")))
    }

    pub async fn list(&self, salon_id: Option<&str>, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM commandes
            WHERE ($1::varchar IS NULL OR salon_id = $1)
              AND ($2::bool IS NULL OR est_ouverte = $2)
              AND ($3::uuid IS NULL OR client_id = $3)
              AND ($4::date IS NULL OR date_livraison >= $4)
              AND ($5::date IS NULL OR date_livraison <= $5)
            ORDER BY date_creation DESC
            "#
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(salon_id)
            .bind(filter.open)
            .bind(filter.client_id)
            .bind(filter.delivery_from)
            .bind(filter.delivery_to)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    /// Commandes ainda com saldo a receber, as mais antigas primeiro.
    pub async fn list_outstanding(&self, salon_id: Option<&str>) -> Result<Vec<Order>, AppError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM commandes
            WHERE ($1::varchar IS NULL OR salon_id = $1) AND reste > 0
            ORDER BY date_creation
            "#
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(salon_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn set_image(
        &self,
        id: Uuid,
        kind: OrderImageKind,
        file: StoredFile,
        name: Option<&str>,
    ) -> Result<Order, AppError> {
        let (path, data) = file.into_columns();
        let assignments = match kind {
            OrderImageKind::Fabric => {
                "fabric_image_path = $2, fabric_image = $3, fabric_image_name = $4"
            }
            OrderImageKind::Model => "model_image_path = $2, model_image = $3, model_image_name = $4",
        };
        let sql = format!("UPDATE commandes SET {assignments} WHERE id = $1 RETURNING {COLUMNS}");

        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(path)
            .bind(data)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("commande {id}")))
    }

    pub async fn get_image(&self, id: Uuid, kind: OrderImageKind) -> Result<Option<OrderFile>, AppError> {
        let sql = match kind {
            OrderImageKind::Fabric => {
                "SELECT fabric_image_name AS name, fabric_image_path AS path, fabric_image AS data FROM commandes WHERE id = $1"
            }
            OrderImageKind::Model => {
                "SELECT model_image_name AS name, model_image_path AS path, model_image AS data FROM commandes WHERE id = $1"
            }
        };
        let row = sqlx::query_as::<_, FileRow>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(FileRow::into_file))
    }

    pub async fn set_pdf(&self, id: Uuid, file: StoredFile, name: &str) -> Result<(), AppError> {
        let (path, data) = file.into_columns();
        let result = sqlx::query(
            "UPDATE commandes SET pdf_path = $2, pdf_data = $3, pdf_name = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(path)
        .bind(data)
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("commande {id}")));
        }
        Ok(())
    }

    pub async fn get_pdf(&self, id: Uuid) -> Result<Option<OrderFile>, AppError> {
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT pdf_name AS name, pdf_path AS path, pdf_data AS data FROM commandes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(FileRow::into_file))
    }
}

fn split_image(image: Option<(StoredFile, Option<String>)>) -> (Option<String>, Option<Vec<u8>>, Option<String>) {
    match image {
        Some((file, name)) => {
            let (path, data) = file.into_columns();
            (path, data, name)
        }
        None => (None, None, None),
    }
}
