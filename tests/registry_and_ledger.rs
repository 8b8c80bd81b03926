//! Salons, charges, lembretes, logo e indicadores contra um Postgres real.

mod support;

use atelier::{
    common::error::AppError,
    models::{
        client::CreateClientPayload,
        dashboard::DateRange,
        expense::{CreateExpensePayload, ExpenseFilter, ExpenseType, NewExpenseDocument},
        logo::NewLogo,
        storage::StoredFile,
    },
};
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use support::{create_order, create_salon, d, fixture, order_payload};

fn expense(type_charge: ExpenseType, montant: i64, reference: Option<&str>) -> CreateExpensePayload {
    CreateExpensePayload {
        type_charge,
        categorie: "Loyer".into(),
        description: None,
        montant: d(montant),
        date_charge: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        reference: reference.map(str::to_string),
        commande_id: None,
        employe_id: None,
        fichier_justificatif: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn salon_ids_follow_the_prefix_sequence(pool: PgPool) {
    let fx = fixture(pool).await;
    assert_eq!(fx.salon_id, "Jaind_000");

    let (second, admin) = create_salon(&fx.state, &fx.super_admin, "Atelier Médina", "ADMIN02").await;
    assert_eq!(second, "Jaind_001");
    assert_eq!(admin.salon_id.as_deref(), Some("Jaind_001"));

    let next = fx.state.salon_service.preview_next_id(&fx.state.db_pool).await.unwrap();
    assert_eq!(next, "Jaind_002");

    let denied = fx
        .state
        .salon_service
        .deactivate_salon(&fx.state.db_pool, &fx.admin, &second)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let salon = fx
        .state
        .salon_service
        .deactivate_salon(&fx.state.db_pool, &fx.super_admin, &second)
        .await
        .unwrap();
    assert!(!salon.actif);

    // Contas de salon desativado não entram
    let login = fx.state.auth_service.login("ADMIN02", "motdepasse").await;
    assert!(login.is_err());
    assert!(fx.state.auth_service.login("ADMIN01", "motdepasse").await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn expense_references_are_suggested_and_collisions_flagged(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.expense_service;
    let db = &fx.state.db_pool;

    let first = svc
        .record_expense(db, &fx.admin, &fx.salon_id, &expense(ExpenseType::Fixe, 75_000, None))
        .await
        .unwrap();
    assert_eq!(first.expense.reference.as_deref(), Some("1"));
    assert!(!first.reference_collision);

    let second = svc
        .record_expense(db, &fx.admin, &fx.salon_id, &expense(ExpenseType::Ponctuelle, 5_000, None))
        .await
        .unwrap();
    assert_eq!(second.expense.reference.as_deref(), Some("2"));

    let duplicate = svc
        .record_expense(db, &fx.admin, &fx.salon_id, &expense(ExpenseType::Ponctuelle, 2_500, Some("2")))
        .await
        .unwrap();
    assert!(duplicate.reference_collision);

    let preview = svc.preview_next_reference(db, &fx.admin, &fx.salon_id).await.unwrap();
    assert_eq!(preview, "3");

    let total = svc.total_expenses(&fx.admin, None, &ExpenseFilter::default()).await.unwrap();
    assert_eq!(total.total, d(82_500));
    assert_eq!(total.nb_charges, 3);

    let salary_without_employee = svc
        .record_expense(db, &fx.admin, &fx.salon_id, &expense(ExpenseType::Salaire, 60_000, None))
        .await;
    assert!(matches!(salary_without_employee, Err(AppError::InvalidInput(_))));

    let mut salary = expense(ExpenseType::Salaire, 60_000, None);
    salary.employe_id = Some(fx.employe.id);
    svc.record_expense(db, &fx.admin, &fx.salon_id, &salary).await.unwrap();

    let (other_salon, _) = create_salon(&fx.state, &fx.super_admin, "Atelier Plateau", "ADMIN02").await;
    let foreign = svc.record_expense(db, &fx.admin, &other_salon, &salary).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn expense_documents_keep_their_content(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.expense_service;

    let charge = svc
        .record_expense(&fx.state.db_pool, &fx.admin, &fx.salon_id, &expense(ExpenseType::Fixe, 75_000, None))
        .await
        .unwrap()
        .expense;

    let doc = svc
        .attach_document(
            &fx.admin,
            charge.id,
            NewExpenseDocument {
                file_name: "facture-loyer.pdf".into(),
                mime_type: Some("application/pdf".into()),
                description: Some("Mars".into()),
                file: StoredFile::Inline(b"%PDF-1.4 facture".to_vec()),
            },
        )
        .await
        .unwrap();
    assert!(doc.stored_inline);

    let empty = svc
        .attach_document(
            &fx.admin,
            charge.id,
            NewExpenseDocument {
                file_name: "vide.pdf".into(),
                mime_type: None,
                description: None,
                file: StoredFile::Inline(Vec::new()),
            },
        )
        .await;
    assert!(matches!(empty, Err(AppError::InvalidInput(_))));

    let listed = svc.list_documents(&fx.employe, charge.id).await.unwrap();
    assert_eq!(listed.len(), 1);

    let content = svc.get_document(&fx.admin, doc.id).await.unwrap();
    assert_eq!(content.file.load().await.unwrap(), b"%PDF-1.4 facture".to_vec());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reminders_are_sent_once_per_delivery_date(pool: PgPool) {
    let fx = fixture(pool).await;
    let db = &fx.state.db_pool;
    let today = Utc::now().date_naive();

    let soon = fx
        .state
        .order_service
        .create_order(db, &fx.admin, &order_payload(fx.client.id, 30_000, 10_000, today.checked_add_days(Days::new(1))))
        .await
        .unwrap();
    let later = fx
        .state
        .order_service
        .create_order(db, &fx.admin, &order_payload(fx.client.id, 30_000, 10_000, today.checked_add_days(Days::new(5))))
        .await
        .unwrap();

    let report = fx.state.reminder_service.run_due_reminders(today, None).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(fx.notifier.sent.lock().unwrap().as_slice(), &[soon.id]);

    let again = fx.state.reminder_service.run_due_reminders(today, None).await.unwrap();
    assert_eq!(again.examined, 0);

    let manual = fx
        .state
        .reminder_service
        .mark_reminder_sent(db, &fx.employe, soon.id, None)
        .await
        .unwrap();
    assert!(manual.is_none());

    let marked = fx
        .state
        .reminder_service
        .mark_reminder_sent(db, &fx.employe, later.id, None)
        .await
        .unwrap();
    assert!(marked.is_some());

    let reminders = fx.state.reminder_service.list_for_order(db, &fx.admin, soon.id).await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert!(reminders[0].couturier_id.is_none());

    let denied = fx.state.reminder_service.run_now(&fx.employe, None).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn manual_reminder_run_stays_inside_the_admin_salon(pool: PgPool) {
    let fx = fixture(pool).await;
    let db = &fx.state.db_pool;
    let tomorrow = Utc::now().date_naive().checked_add_days(Days::new(1));

    let ours = fx
        .state
        .order_service
        .create_order(db, &fx.admin, &order_payload(fx.client.id, 30_000, 10_000, tomorrow))
        .await
        .unwrap();

    let (other_salon, other_admin) = create_salon(&fx.state, &fx.super_admin, "Atelier Plateau", "ADMIN02").await;
    let their_client = fx
        .state
        .client_service
        .create_client(
            db,
            &other_admin,
            &CreateClientPayload {
                nom: "Fall".into(),
                prenom: "Ibrahima".into(),
                telephone: "770000001".into(),
                email: None,
                adresse: None,
            },
        )
        .await
        .unwrap()
        .client;
    let theirs = fx
        .state
        .order_service
        .create_order(db, &other_admin, &order_payload(their_client.id, 20_000, 0, tomorrow))
        .await
        .unwrap();

    let report = fx.state.reminder_service.run_now(&fx.admin, None).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(fx.notifier.sent.lock().unwrap().as_slice(), &[ours.id]);

    let foreign = fx.state.reminder_service.run_now(&fx.admin, Some(other_salon.as_str())).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    // O outro salon continua sem lembrete até a sua própria varredura
    let untouched = fx.state.reminder_service.list_for_order(db, &other_admin, theirs.id).await.unwrap();
    assert!(untouched.is_empty());

    let everything = fx.state.reminder_service.run_now(&fx.super_admin, None).await.unwrap();
    assert_eq!(everything.examined, 1);
    assert_eq!(fx.notifier.sent.lock().unwrap().as_slice(), &[ours.id, theirs.id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn logo_is_replaced_and_removed_by_the_salon_admin(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.branding_service;
    let png = vec![137, 80, 78, 71, 13, 10, 26, 10];

    let logo = |data: Vec<u8>| NewLogo {
        logo_name: "logo.png".into(),
        mime_type: "image/png".into(),
        description: None,
        data,
    };

    let denied = svc.upload_logo(&fx.employe, &fx.salon_id, logo(png.clone())).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    svc.upload_logo(&fx.admin, &fx.salon_id, logo(vec![1, 2, 3])).await.unwrap();
    let saved = svc.upload_logo(&fx.admin, &fx.salon_id, logo(png.clone())).await.unwrap();
    assert_eq!(saved.file_size, png.len() as i64);

    let content = svc.get_logo(&fx.employe, &fx.salon_id).await.unwrap();
    assert_eq!(content.logo_data, png);

    svc.delete_logo(&fx.admin, &fx.salon_id).await.unwrap();
    let gone = svc.delete_logo(&fx.admin, &fx.salon_id).await;
    assert!(matches!(gone, Err(AppError::ResourceNotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn dashboard_summarizes_orders_and_expenses(pool: PgPool) {
    let fx = fixture(pool).await;
    create_order(&fx, &fx.admin, 50_000, 20_000).await;
    create_order(&fx, &fx.employe, 30_000, 30_000).await;
    fx.state
        .expense_service
        .record_expense(&fx.state.db_pool, &fx.admin, &fx.salon_id, &expense(ExpenseType::Fixe, 10_000, None))
        .await
        .unwrap();

    let range = DateRange::default();
    let summary = fx
        .state
        .dashboard_service
        .get_summary(&fx.state.db_pool, &fx.admin, None, &range)
        .await
        .unwrap();

    assert_eq!(summary.nb_commandes, 2);
    assert_eq!(summary.ca_total, d(80_000));
    assert_eq!(summary.avances_total, d(50_000));
    assert_eq!(summary.reste_total, d(30_000));
    assert_eq!(summary.taux_avance, Decimal::new(6250, 2));
    assert_eq!(summary.charges_total, d(10_000));
    assert_eq!(summary.benefice, d(40_000));

    let top = fx
        .state
        .dashboard_service
        .get_top_models(&fx.admin, None, &range)
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].nb_commandes, 2);

    let denied = fx.state.dashboard_service.get_status_breakdown(&fx.employe, None, &range).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}
