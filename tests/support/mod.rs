#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use atelier::{
    config::{AppState, Settings},
    models::{
        auth::{Couturier, CreateUserPayload, Role},
        client::{Client, CreateClientPayload},
        measurements::{self, ADULTE},
        order::{CreateOrderPayload, Measurements, Order},
        reminder::ReminderNotice,
        salon::{AdminAccountPayload, CreateSalonPayload},
    },
    services::reminder_service::ReminderNotifier,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub const JWT_SECRET: &str = "segredo-de-teste";

/// Guarda as commandes notificadas em vez de enviar algo.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl ReminderNotifier for RecordingNotifier {
    async fn notify(&self, notice: &ReminderNotice) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notice.delivery.commande_id);
        Ok(())
    }
}

pub struct Fixture {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub super_admin: Couturier,
    pub admin: Couturier,
    pub employe: Couturier,
    pub salon_id: String,
    pub client: Client,
}

pub fn d(value: i64) -> Decimal {
    Decimal::new(value, 0)
}

pub async fn fixture(pool: PgPool) -> Fixture {
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = Settings::for_database("postgres://localhost/atelier_test", JWT_SECRET);
    let state = AppState::with_notifier(pool, settings, notifier.clone()).unwrap();

    let super_admin = state
        .user_service
        .ensure_super_admin(&state.db_pool, "SUPER", "motdepasse")
        .await
        .unwrap()
        .unwrap();

    let created = create_salon(&state, &super_admin, "Atelier Jaind", "ADMIN01").await;
    let admin = created.1;
    let salon_id = created.0;

    let employe = state
        .user_service
        .create_user(
            &state.db_pool,
            &admin,
            &CreateUserPayload {
                code_couturier: "EMP01".into(),
                password: "motdepasse".into(),
                nom: "Diallo".into(),
                prenom: "Awa".into(),
                email: None,
                telephone: None,
                role: Role::Employe,
                salon_id: None,
            },
        )
        .await
        .unwrap();

    let client = state
        .client_service
        .create_client(
            &state.db_pool,
            &admin,
            &CreateClientPayload {
                nom: "Ndiaye".into(),
                prenom: "Moussa".into(),
                telephone: "771234567".into(),
                email: None,
                adresse: None,
            },
        )
        .await
        .unwrap()
        .client;

    Fixture { state, notifier, super_admin, admin, employe, salon_id, client }
}

/// Cria um salon com o seu admin; devolve (salon_id, admin).
pub async fn create_salon(state: &AppState, super_admin: &Couturier, nom: &str, admin_code: &str) -> (String, Couturier) {
    let created = state
        .salon_service
        .create_salon_with_admin(
            super_admin,
            &CreateSalonPayload {
                nom: nom.into(),
                quartier: None,
                responsable: None,
                telephone: None,
                email: None,
                code_admin: format!("CODE-{admin_code}"),
                admin: AdminAccountPayload {
                    code_couturier: admin_code.into(),
                    password: "motdepasse".into(),
                    nom: "Sow".into(),
                    prenom: "Fatou".into(),
                    email: Some(format!("{}@atelier.test", admin_code.to_lowercase())),
                    telephone: None,
                },
            },
        )
        .await
        .unwrap();
    (created.salon.salon_id, created.admin)
}

pub fn trouser_measurements() -> Measurements {
    measurements::expected_keys(ADULTE, "homme", "Pantalon classique")
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, key)| (key.to_string(), Decimal::new(80 + i as i64, 0)))
        .collect()
}

pub fn order_payload(client_id: Uuid, prix_total: i64, avance: i64, livraison: Option<NaiveDate>) -> CreateOrderPayload {
    CreateOrderPayload {
        client_id,
        categorie: ADULTE.into(),
        sexe: "homme".into(),
        modele: "Pantalon classique".into(),
        mesures: trouser_measurements(),
        prix_total: d(prix_total),
        avance: d(avance),
        date_livraison: livraison,
        model_type: None,
        fabric_image_path: None,
        model_image_path: None,
    }
}

pub async fn create_order(fx: &Fixture, actor: &Couturier, prix_total: i64, avance: i64) -> Order {
    fx.state
        .order_service
        .create_order(&fx.state.db_pool, actor, &order_payload(fx.client.id, prix_total, avance, None))
        .await
        .unwrap()
}
