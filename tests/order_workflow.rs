//! Fluxo completo de uma commande contra um Postgres real.
//! Rodar com `DATABASE_URL` definido e `cargo test -- --ignored`.

mod support;

use atelier::{
    common::error::AppError,
    models::{
        history::{replay, HistoryAction, PendingFilter, ValidationStatus},
        order::{status, OrderFilter, OrderImageKind},
        storage::StoredFile,
    },
};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat, Rgb, RgbImage};
use rust_decimal::Decimal;
use sqlx::PgPool;

use support::{create_order, create_salon, d, fixture};

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn creation_opens_history_with_initial_advance(pool: PgPool) {
    let fx = fixture(pool).await;
    let order = create_order(&fx, &fx.employe, 50_000, 20_000).await;

    assert_eq!(order.reste, d(30_000));
    assert_eq!(order.statut, status::EN_COURS);
    assert!(order.est_ouverte);
    assert_eq!(order.salon_id, fx.salon_id);

    let history = fx
        .state
        .order_service
        .order_history(&fx.state.db_pool, &fx.employe, order.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].type_action, HistoryAction::Creation);
    assert_eq!(history[0].montant_paye, d(20_000));
    // Criação por employe não espera validação
    assert_eq!(history[0].statut_validation, ValidationStatus::Validee);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn employee_payment_then_closure_goes_through_approval(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.order_service;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.employe, 50_000, 20_000).await;

    let paid = svc
        .record_payment(db, &fx.employe, order.id, d(30_000), Some("solde".into()))
        .await
        .unwrap();
    assert_eq!(paid.order.reste, Decimal::ZERO);
    assert_eq!(paid.order.statut, status::TERMINE);
    assert_eq!(paid.entry.statut_validation, ValidationStatus::EnAttente);

    // Fechar com pagamento pendente é recusado, mesmo para o admin
    let blocked = svc.close_order(db, &fx.admin, order.id, None).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    let pending = fx
        .state
        .approval_service
        .list_pending(&fx.admin, None, &PendingFilter::default())
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].entry.id, paid.entry.id);

    let approved = fx
        .state
        .approval_service
        .approve(db, &fx.admin, paid.entry.id, Some("reçu en caisse"))
        .await
        .unwrap();
    assert_eq!(approved.entry.statut_validation, ValidationStatus::Validee);
    assert_eq!(approved.entry.admin_validation_id, Some(fx.admin.id));

    let request = svc.close_order(db, &fx.employe, order.id, None).await.unwrap();
    assert!(request.created);
    assert!(request.order.est_ouverte);

    // Segundo pedido devolve o mesmo pendente
    let again = svc.close_order(db, &fx.employe, order.id, None).await.unwrap();
    assert!(!again.created);
    assert_eq!(again.entry.id, request.entry.id);

    let closed = fx
        .state
        .approval_service
        .approve(db, &fx.admin, request.entry.id, None)
        .await
        .unwrap();
    assert_eq!(closed.order.statut, status::LIVRE_ET_PAYE);
    assert!(!closed.order.est_ouverte);

    let decided_twice = fx.state.approval_service.approve(db, &fx.admin, request.entry.id, None).await;
    assert!(matches!(decided_twice, Err(AppError::AlreadyDecided(_))));

    let late_payment = svc.record_payment(db, &fx.admin, order.id, d(1), None).await;
    assert!(matches!(late_payment, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rejected_payment_is_reversed_by_a_correction_entry(pool: PgPool) {
    let fx = fixture(pool).await;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.admin, 50_000, 20_000).await;

    let paid = fx
        .state
        .order_service
        .record_payment(db, &fx.employe, order.id, d(30_000), None)
        .await
        .unwrap();
    assert_eq!(paid.order.statut, status::TERMINE);

    let outcome = fx
        .state
        .approval_service
        .reject(db, &fx.admin, paid.entry.id, "Montant non reçu")
        .await
        .unwrap();

    assert_eq!(outcome.entry.statut_validation, ValidationStatus::Rejetee);
    assert_eq!(outcome.entry.commentaire_admin.as_deref(), Some("Montant non reçu"));
    assert_eq!(outcome.order.avance, d(20_000));
    assert_eq!(outcome.order.reste, d(30_000));
    assert_eq!(outcome.order.statut, status::EN_COURS);

    let correction = outcome.correction.unwrap();
    assert_eq!(correction.type_action, HistoryAction::Correction);
    assert_eq!(correction.montant_paye, d(-30_000));
    assert_eq!(correction.reste_apres_paiement, d(30_000));

    let history = fx
        .state
        .order_service
        .order_history(db, &fx.admin, order.id)
        .await
        .unwrap();
    let replayed = replay(&history).unwrap();
    assert_eq!(replayed.avance, outcome.order.avance);
    assert_eq!(replayed.reste, outcome.order.reste);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_payments_are_serialized(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = fx.state.order_service.clone();
    let db = fx.state.db_pool.clone();
    let order = create_order(&fx, &fx.admin, 50_000, 20_000).await;

    let (first, second) = tokio::join!(
        svc.record_payment(&db, &fx.admin, order.id, d(15_000), None),
        svc.record_payment(&db, &fx.admin, order.id, d(15_000), None),
    );
    first.unwrap();
    second.unwrap();

    let current = svc.get_order(&db, &fx.admin, order.id).await.unwrap();
    assert_eq!(current.avance, d(50_000));
    assert_eq!(current.reste, Decimal::ZERO);

    let overpay = svc.record_payment(&db, &fx.admin, order.id, d(1), None).await;
    assert!(matches!(overpay, Err(AppError::InvalidAmount(_))));

    let history = svc.order_history(&db, &fx.admin, order.id).await.unwrap();
    let seqs: Vec<i64> = history.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(replay(&history).unwrap().avance, current.avance);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn terminal_status_requires_settled_balance(pool: PgPool) {
    let fx = fixture(pool).await;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.admin, 40_000, 10_000).await;

    let early = fx
        .state
        .order_service
        .update_status(db, &fx.admin, order.id, status::LIVRE_ET_PAYE, None)
        .await;
    assert!(matches!(early, Err(AppError::NotFullyPaid { .. })));

    let not_paid = fx.state.order_service.close_order(db, &fx.admin, order.id, None).await;
    assert!(matches!(not_paid, Err(AppError::NotFullyPaid { .. })));

    let repriced = fx
        .state
        .order_service
        .adjust_price(db, &fx.admin, order.id, d(10_000), None)
        .await
        .unwrap();
    assert_eq!(repriced.order.reste, Decimal::ZERO);

    let denied = fx
        .state
        .order_service
        .adjust_price(db, &fx.employe, order.id, d(12_000), None)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let delivered = fx
        .state
        .order_service
        .update_status(db, &fx.admin, order.id, status::LIVRE_ET_PAYE, None)
        .await
        .unwrap();
    assert!(!delivered.order.est_ouverte);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn orders_stay_inside_their_salon(pool: PgPool) {
    let fx = fixture(pool).await;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.admin, 30_000, 0).await;

    let (other_salon, other_admin) = create_salon(&fx.state, &fx.super_admin, "Atelier Plateau", "ADMIN02").await;
    assert_ne!(other_salon, fx.salon_id);

    let foreign = fx.state.order_service.get_order(db, &other_admin, order.id).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    let theirs = fx
        .state
        .order_service
        .list_orders(&other_admin, None, &OrderFilter::default())
        .await
        .unwrap();
    assert!(theirs.is_empty());

    let everything = fx
        .state
        .order_service
        .list_orders(&fx.super_admin, None, &OrderFilter::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 1);

    let balances = fx.state.order_service.orders_with_balance(&fx.admin, None).await.unwrap();
    assert_eq!(balances.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn admin_pays_off_and_closes_in_one_go(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.order_service;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.admin, 50_000, 20_000).await;

    let paid = svc.record_payment(db, &fx.admin, order.id, d(30_000), None).await.unwrap();
    assert_eq!(paid.order.avance, d(50_000));
    assert_eq!(paid.order.reste, Decimal::ZERO);
    assert_eq!(paid.entry.montant_paye, d(30_000));
    assert_eq!(paid.entry.reste_apres_paiement, Decimal::ZERO);
    assert_eq!(paid.entry.statut_validation, ValidationStatus::Validee);

    let closed = svc.close_order(db, &fx.admin, order.id, None).await.unwrap();
    assert!(!closed.order.est_ouverte);
    assert_eq!(closed.order.statut, status::LIVRE_ET_PAYE);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn invalid_amounts_leave_the_order_untouched(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.order_service;
    let db = &fx.state.db_pool;

    let too_much = svc
        .create_order(db, &fx.admin, &support::order_payload(fx.client.id, 45_000, 50_000, None))
        .await;
    assert!(matches!(too_much, Err(AppError::InvalidInput(_))));

    let order = create_order(&fx, &fx.admin, 50_000, 20_000).await;
    let negative = svc.record_payment(db, &fx.admin, order.id, d(-5), None).await;
    assert!(matches!(negative, Err(AppError::InvalidAmount(_))));

    let current = svc.get_order(db, &fx.admin, order.id).await.unwrap();
    assert_eq!(current.avance, d(20_000));
    assert_eq!(current.reste, d(30_000));
    let history = svc.order_history(db, &fx.admin, order.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn only_one_of_two_racing_payments_fits_the_balance(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = fx.state.order_service.clone();
    let db = fx.state.db_pool.clone();
    let order = create_order(&fx, &fx.admin, 50_000, 35_000).await;

    let (first, second) = tokio::join!(
        svc.record_payment(&db, &fx.admin, order.id, d(10_000), None),
        svc.record_payment(&db, &fx.admin, order.id, d(10_000), None),
    );
    let accepted = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    assert!(
        [first, second]
            .into_iter()
            .any(|r| matches!(r, Err(AppError::InvalidAmount(_))))
    );

    let current = svc.get_order(&db, &fx.admin, order.id).await.unwrap();
    assert_eq!(current.avance, d(45_000));
    assert_eq!(current.reste, d(5_000));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn delivered_order_can_be_reopened(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.order_service;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.admin, 20_000, 20_000).await;

    let delivered = svc
        .update_status(db, &fx.admin, order.id, status::LIVRE_ET_PAYE, None)
        .await
        .unwrap();
    assert!(!delivered.order.est_ouverte);

    let reopened = svc
        .update_status(db, &fx.admin, order.id, status::EN_COURS, Some("retouche demandée".into()))
        .await
        .unwrap();
    assert_eq!(reopened.order.statut, status::EN_COURS);
    assert!(reopened.order.est_ouverte);
    assert_eq!(reopened.entry.statut_avant.as_deref(), Some(status::LIVRE_ET_PAYE));

    let current = svc.get_order(db, &fx.admin, order.id).await.unwrap();
    assert!(current.est_ouverte);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn employee_status_change_waits_for_the_admin(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.order_service;
    let approvals = &fx.state.approval_service;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.admin, 30_000, 10_000).await;

    let requested = svc
        .update_status(db, &fx.employe, order.id, "Retouche", None)
        .await
        .unwrap();
    assert_eq!(requested.entry.type_action, HistoryAction::ChangementStatut);
    assert_eq!(requested.entry.statut_validation, ValidationStatus::EnAttente);
    assert_eq!(requested.order.statut, status::EN_COURS);
    assert_eq!(svc.get_order(db, &fx.admin, order.id).await.unwrap().statut, status::EN_COURS);

    let approved = approvals.approve(db, &fx.admin, requested.entry.id, None).await.unwrap();
    assert_eq!(approved.order.statut, "Retouche");
    assert!(approved.order.est_ouverte);

    // Um segundo pedido, rejeitado, não muda nada
    let second = svc
        .update_status(db, &fx.employe, order.id, status::EN_COURS, None)
        .await
        .unwrap();
    let rejected = approvals
        .reject(db, &fx.admin, second.entry.id, "Retouche pas finie")
        .await
        .unwrap();
    assert_eq!(rejected.entry.statut_validation, ValidationStatus::Rejetee);
    assert_eq!(rejected.order.statut, "Retouche");
    assert!(rejected.correction.is_none());
    assert_eq!(svc.get_order(db, &fx.admin, order.id).await.unwrap().statut, "Retouche");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn admin_close_validates_the_pending_request(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.order_service;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.admin, 25_000, 25_000).await;

    let request = svc.close_order(db, &fx.employe, order.id, None).await.unwrap();
    assert!(request.created);
    assert_eq!(request.entry.statut_validation, ValidationStatus::EnAttente);

    let closed = svc
        .close_order(db, &fx.admin, order.id, Some("livrée".into()))
        .await
        .unwrap();
    assert!(!closed.created);
    assert_eq!(closed.entry.id, request.entry.id);
    assert_eq!(closed.entry.statut_validation, ValidationStatus::Validee);
    assert_eq!(closed.entry.admin_validation_id, Some(fx.admin.id));
    assert_eq!(closed.order.statut, status::LIVRE_ET_PAYE);
    assert!(!closed.order.est_ouverte);

    let pending = fx
        .state
        .approval_service
        .list_pending(&fx.admin, None, &PendingFilter::default())
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn uploaded_images_are_shrunk_before_storage(pool: PgPool) {
    let fx = fixture(pool).await;
    let svc = &fx.state.order_service;
    let db = &fx.state.db_pool;
    let order = create_order(&fx, &fx.employe, 30_000, 0).await;

    let photo = RgbImage::from_fn(2400, 3200, |x, y| Rgb([(x % 200) as u8, (y % 200) as u8, 40]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(photo).write_to(&mut png, ImageOutputFormat::Png).unwrap();

    let updated = svc
        .attach_image(db, &fx.employe, order.id, OrderImageKind::Fabric, StoredFile::Inline(png), Some("tissu.png"))
        .await
        .unwrap();
    assert!(updated.has_fabric_image);

    let stored = svc
        .get_image(db, &fx.employe, order.id, OrderImageKind::Fabric)
        .await
        .unwrap()
        .file
        .load()
        .await
        .unwrap();
    assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);
    assert!(stored.len() <= 2 * 1024 * 1024);
    assert_eq!(image::load_from_memory(&stored).unwrap().dimensions(), (1440, 1920));

    // Bytes que não são imagem ficam como vieram
    svc.attach_image(db, &fx.employe, order.id, OrderImageKind::Model, StoredFile::Inline(b"brut".to_vec()), None)
        .await
        .unwrap();
    let raw = svc.get_image(db, &fx.employe, order.id, OrderImageKind::Model).await.unwrap();
    assert_eq!(raw.file, StoredFile::Inline(b"brut".to_vec()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn out_of_range_total_is_a_validation_error(pool: PgPool) {
    let fx = fixture(pool).await;
    let mut payload = support::order_payload(fx.client.id, 0, 0, None);
    payload.prix_total = Decimal::new(100_000_000_000, 0);

    let err = fx
        .state
        .order_service
        .create_order(&fx.state.db_pool, &fx.admin, &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(!err.is_retryable());

    let orders = fx
        .state
        .order_service
        .list_orders(&fx.admin, None, &OrderFilter::default())
        .await
        .unwrap();
    assert!(orders.is_empty());
}
