// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use serde_json::json;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClientRepository, LogoRepository, OrderRepository, SalonRepository},
    models::{auth::Couturier, client::Client, order::Order, salon::Salon, storage::StoredFile},
    services::order_service::OrderService,
};

// Tudo o que o recibo precisa, já carregado do banco
struct Receipt {
    salon: Salon,
    client: Client,
    order: Order,
    logo: Option<Vec<u8>>,
}

#[derive(Clone)]
pub struct DocumentService {
    order_service: OrderService,
    order_repo: OrderRepository,
    client_repo: ClientRepository,
    salon_repo: SalonRepository,
    logo_repo: LogoRepository,
    fonts_dir: PathBuf,
    pdf_dir: Option<PathBuf>,
}

impl DocumentService {
    pub fn new(
        order_service: OrderService,
        order_repo: OrderRepository,
        client_repo: ClientRepository,
        salon_repo: SalonRepository,
        logo_repo: LogoRepository,
        fonts_dir: PathBuf,
        pdf_dir: Option<PathBuf>,
    ) -> Self {
        Self { order_service, order_repo, client_repo, salon_repo, logo_repo, fonts_dir, pdf_dir }
    }

    /// Gera o recibo em PDF e o guarda na commande: em disco quando há
    /// diretório configurado, senão no próprio banco.
    pub async fn generate_order_pdf<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
    ) -> Result<Vec<u8>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Busca os dados
        let order = self.order_service.get_order(&mut *tx, actor, order_id).await?;
        let salon = self
            .salon_repo
            .find_by_id(&mut *tx, &order.salon_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("salon {}", order.salon_id)))?;
        tx.commit().await?;

        let client = self
            .client_repo
            .find_by_id(order.client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("client {}", order.client_id)))?;
        let logo = self.logo_repo.get(&salon.salon_id).await?.map(|l| l.logo_data);

        // 2. Renderiza fora do runtime
        let fonts_dir = self.fonts_dir.clone();
        let receipt = Receipt { salon, client, order, logo };
        let (receipt, bytes) = tokio::task::spawn_blocking(move || {
            let bytes = render_receipt(&fonts_dir, &receipt);
            (receipt, bytes)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task do PDF: {}", e))?;
        let bytes = bytes?;

        // 3. Armazena
        let file_name = format!("commande_{}.pdf", receipt.order.id);
        let stored = match &self.pdf_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let path = dir.join(&file_name);
                tokio::fs::write(&path, &bytes).await?;
                StoredFile::Reference(path.to_string_lossy().into_owned())
            }
            None => StoredFile::Inline(bytes.clone()),
        };
        self.order_repo.set_pdf(receipt.order.id, stored, &file_name).await?;

        tracing::info!(commande = %receipt.order.id, taille = bytes.len(), "reçu PDF généré");
        Ok(bytes)
    }

    /// Último PDF gerado, com o nome do arquivo.
    pub async fn get_pdf<'e, E>(
        &self,
        executor: E,
        actor: &Couturier,
        order_id: Uuid,
    ) -> Result<(String, Vec<u8>), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = self.order_service.get_order(executor, actor, order_id).await?;
        let pdf = self
            .order_repo
            .get_pdf(order.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("reçu de la commande {order_id}")))?;

        let name = pdf.name.unwrap_or_else(|| format!("commande_{order_id}.pdf"));
        Ok((name, pdf.file.load().await?))
    }
}

/// Pares rótulo/valor do bloco de identificação do recibo.
pub fn order_summary_lines(order: &Order, client: &Client) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("Client", client.full_name()),
        ("Téléphone", client.telephone.clone()),
        ("Modèle", order.modele.clone()),
        ("Catégorie", format!("{} / {}", order.categorie, order.sexe)),
        ("Date de commande", order.date_creation.format("%d/%m/%Y").to_string()),
    ];
    if let Some(date) = order.date_livraison {
        lines.push(("Livraison prévue", date.format("%d/%m/%Y").to_string()));
    }
    if let Some(model_type) = order.model_type.as_deref().filter(|t| !t.is_empty()) {
        lines.push(("Type de modèle", model_type.to_string()));
    }
    lines.push(("Statut", order.statut.clone()));
    lines
}

pub fn money_lines(order: &Order) -> [(&'static str, String); 3] {
    [
        ("Prix total", format!("{:.2} FCFA", order.prix_total)),
        ("Avance", format!("{:.2} FCFA", order.avance)),
        ("Reste à payer", format!("{:.2} FCFA", order.reste)),
    ]
}

/// Conteúdo do QR code: referência da commande e o essencial em JSON.
pub fn qr_payload(order: &Order, client: &Client, salon: &Salon) -> String {
    json!({
        "commande": order.id,
        "salon": salon.salon_id,
        "client": client.full_name(),
        "telephone": client.telephone,
        "modele": order.modele,
        "prixTotal": order.prix_total.to_string(),
        "reste": order.reste.to_string(),
        "livraison": order.date_livraison,
    })
    .to_string()
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

fn render_receipt(fonts_dir: &std::path::Path, receipt: &Receipt) -> Result<Vec<u8>, AppError> {
    let Receipt { salon, client, order, logo } = receipt;

    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None)
        .map_err(|_| AppError::FontNotFound(format!("Roboto em {}", fonts_dir.display())))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Commande {}", order.id));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    if let Some(bytes) = logo {
        // genpdf não aceita canal alfa: converte para RGB
        match image::load_from_memory(bytes) {
            Ok(img) => {
                let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
                let logo = elements::Image::from_dynamic_image(rgb)
                    .map_err(pdf_error)?
                    .with_scale(genpdf::Scale::new(0.3, 0.3));
                doc.push(logo);
            }
            Err(e) => tracing::warn!(salon = %salon.salon_id, "logo illisible, ignoré: {e}"),
        }
    }

    doc.push(elements::Paragraph::new(salon.nom.as_str()).styled(style::Style::new().bold().with_font_size(18)));
    let contact: Vec<&str> = [salon.quartier.as_deref(), salon.telephone.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !contact.is_empty() {
        doc.push(elements::Paragraph::new(contact.join(" - ")).styled(style::Style::new().with_font_size(10)));
    }

    doc.push(elements::Break::new(1.5));
    doc.push(
        elements::Paragraph::new(format!("REÇU DE COMMANDE #{}", short_ref(order.id)))
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    for (label, value) in order_summary_lines(order, client) {
        doc.push(elements::Paragraph::new(format!("{label}: {value}")));
    }

    doc.push(elements::Break::new(1.5));

    // --- MEDIDAS ---
    let style_bold = style::Style::new().bold();
    let mut table = elements::TableLayout::new(vec![3, 1]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    table
        .row()
        .element(elements::Paragraph::new("Mesure").styled(style_bold))
        .element(elements::Paragraph::new("cm").styled(style_bold))
        .push()
        .map_err(pdf_error)?;
    for (name, value) in order.mesures.iter() {
        table
            .row()
            .element(elements::Paragraph::new(name.as_str()))
            .element(elements::Paragraph::new(value.normalize().to_string()))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(table);
    doc.push(elements::Break::new(1.5));

    // --- TOTAIS ---
    for (label, value) in money_lines(order) {
        let mut line = elements::Paragraph::new(format!("{label}: {value}"));
        line.set_alignment(genpdf::Alignment::Right);
        doc.push(line.styled(style::Style::new().bold().with_font_size(12)));
    }

    doc.push(elements::Break::new(1.5));

    // --- QR CODE ---
    let code = QrCode::new(qr_payload(order, client, salon).as_bytes()).map_err(pdf_error)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let pdf_image = elements::Image::from_dynamic_image(image::DynamicImage::ImageLuma8(image_buffer))
        .map_err(pdf_error)?
        .with_scale(genpdf::Scale::new(0.5, 0.5));
    doc.push(pdf_image);

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

fn short_ref(id: Uuid) -> String {
    id.simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use sqlx::types::Json;

    fn client() -> Client {
        Client {
            id: Uuid::new_v4(),
            couturier_id: Uuid::nil(),
            salon_id: "Jaind_000".into(),
            nom: "Diop".into(),
            prenom: "Moussa".into(),
            telephone: "771234567".into(),
            email: None,
            adresse: None,
            date_creation: Utc::now(),
        }
    }

    fn order(date_livraison: Option<NaiveDate>) -> Order {
        Order {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            couturier_id: Uuid::nil(),
            salon_id: "Jaind_000".into(),
            categorie: "adulte".into(),
            sexe: "homme".into(),
            modele: "Boubou".into(),
            mesures: Json(Default::default()),
            prix_total: Decimal::new(50000, 0),
            avance: Decimal::new(20000, 0),
            reste: Decimal::new(30000, 0),
            date_livraison,
            statut: "En cours".into(),
            est_ouverte: true,
            model_type: None,
            fabric_image_name: None,
            model_image_name: None,
            pdf_name: None,
            has_fabric_image: false,
            has_model_image: false,
            has_pdf: false,
            date_creation: Utc::now(),
            date_dernier_paiement: None,
        }
    }

    #[test]
    fn summary_lists_client_and_delivery() {
        let lines = order_summary_lines(&order(NaiveDate::from_ymd_opt(2026, 3, 14)), &client());
        assert_eq!(lines[0], ("Client", "Moussa Diop".to_string()));
        assert!(lines.contains(&("Livraison prévue", "14/03/2026".to_string())));
        assert_eq!(lines.last().map(|l| l.0), Some("Statut"));
    }

    #[test]
    fn summary_skips_missing_delivery_date() {
        let lines = order_summary_lines(&order(None), &client());
        assert!(lines.iter().all(|(label, _)| *label != "Livraison prévue"));
    }

    #[test]
    fn money_lines_show_two_decimals() {
        let lines = money_lines(&order(None));
        assert_eq!(lines[2], ("Reste à payer", "30000.00 FCFA".to_string()));
    }

    #[test]
    fn short_reference_is_eight_uppercase_chars() {
        let r = short_ref(Uuid::new_v4());
        assert_eq!(r.len(), 8);
        assert_eq!(r, r.to_uppercase());
    }
}
