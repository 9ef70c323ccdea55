// src/services/label_service.rs

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LabelRepository,
    models::{
        label::{LabelableItem, LossResult, PrintLabelPayload, PrintedLabel, RecordLossPayload},
        stock::MovementType,
    },
    services::stock_service::StockService,
};

const FONT_FAMILY: &str = "Roboto";

// Conteúdo do QR code impresso na etiqueta
pub fn label_qr_payload(label: &PrintedLabel) -> String {
    json!({
        "type": "label",
        "id": label.id,
        "item": label.item_name,
        "itemType": label.labelable_type,
        "expirationDate": label.expiration_date,
        "lot": label.lot_number,
    })
    .to_string()
}

/// Linhas de texto da etiqueta, na ordem de impressão.
pub fn label_lines(label: &PrintedLabel) -> Vec<String> {
    let mut lines = vec![
        format!("Fabricação: {}", label.print_date.format("%d/%m/%Y %H:%M")),
        format!("Validade: {}", label.expiration_date.format("%d/%m/%Y")),
    ];

    if let Some(lot) = &label.lot_number {
        lines.push(format!("Lote: {lot}"));
    }
    if let Some(sif) = &label.sif {
        lines.push(format!("SIF: {sif}"));
    }
    if let Some(weight) = label.weight {
        let unit = label.unit_of_measure.as_deref().unwrap_or("");
        lines.push(format!("Peso: {weight} {unit}").trim_end().to_string());
    }
    lines
}

#[derive(Clone)]
pub struct LabelService {
    repo: LabelRepository,
    stock_service: StockService,
    fonts_dir: String,
}

impl LabelService {
    pub fn new(repo: LabelRepository, stock_service: StockService, fonts_dir: String) -> Self {
        Self {
            repo,
            stock_service,
            fonts_dir,
        }
    }

    pub async fn labelable_items(&self, restaurant_id: Uuid) -> Result<Vec<LabelableItem>, AppError> {
        self.stock_service.product_repo().list_labelable(restaurant_id).await
    }

    pub async fn list(&self, restaurant_id: Uuid) -> Result<Vec<PrintedLabel>, AppError> {
        self.repo.list_printed(restaurant_id).await
    }

    pub async fn print(&self, restaurant_id: Uuid, user_id: Uuid, payload: &PrintLabelPayload) -> Result<PrintedLabel, AppError> {
        let product_repo = self.stock_service.product_repo();
        let (item_name, unit, _) = product_repo
            .find_stockable(product_repo.pool(), restaurant_id, payload.labelable_type, payload.labelable_id)
            .await?
            .ok_or(AppError::NotFound("label.item_not_found"))?;

        let label = self.repo.create_printed(restaurant_id, user_id, &item_name, payload).await?;

        tracing::info!(
            %restaurant_id,
            label_id = %label.id,
            item = %item_name,
            unit = %unit,
            copies = label.quantity_printed,
            "Etiqueta registrada"
        );
        Ok(label)
    }

    /// Perda de estoque: registro e saída do estoque na mesma transação.
    pub async fn record_loss(&self, restaurant_id: Uuid, user_id: Uuid, payload: &RecordLossPayload) -> Result<LossResult, AppError> {
        let mut tx = self.repo.pool().begin().await?;

        let notes = format!("Perda: {}", payload.reason);
        let moved = self
            .stock_service
            .apply_in_tx(
                &mut *tx,
                restaurant_id,
                Some(user_id),
                payload.stockable_type,
                payload.stockable_id,
                MovementType::Out,
                payload.quantity,
                Some(&notes),
            )
            .await?;

        let loss = self.repo.create_loss(&mut *tx, restaurant_id, user_id, payload).await?;

        tx.commit().await?;

        tracing::info!(%restaurant_id, loss_id = %loss.id, quantity = %loss.quantity, "Perda registrada");
        Ok(LossResult {
            loss,
            movement: moved.movement,
        })
    }

    pub async fn pdf(&self, restaurant_id: Uuid, label_id: Uuid) -> Result<Vec<u8>, AppError> {
        let label = self
            .repo
            .find_printed(restaurant_id, label_id)
            .await?
            .ok_or(AppError::NotFound("label.not_found"))?;

        let fonts_dir = self.fonts_dir.clone();
        // Renderização síncrona fora do runtime
        tokio::task::spawn_blocking(move || render_label_pdf(&label, &fonts_dir))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de renderização: {}", e))?
    }
}

pub fn render_label_pdf(label: &PrintedLabel, fonts_dir: &str) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, FONT_FAMILY, None)
        .map_err(|_| AppError::FontNotFound(format!("Fonte {FONT_FAMILY} não encontrada em {fonts_dir}")))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Etiqueta {}", label.item_name));
    doc.set_paper_size(genpdf::Size::new(100, 80));

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(5);
    doc.set_page_decorator(decorator);

    let code = QrCode::new(label_qr_payload(label).as_bytes())
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
    let qr_image = image::DynamicImage::ImageLuma8(code.render::<Luma<u8>>().build());

    let copies = label.quantity_printed.max(1);
    for copy in 0..copies {
        if copy > 0 {
            doc.push(elements::PageBreak::new());
        }

        doc.push(
            elements::Paragraph::new(label.item_name.to_uppercase())
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Break::new(0.5));

        for line in label_lines(label) {
            doc.push(elements::Paragraph::new(line).styled(style::Style::new().with_font_size(9)));
        }

        doc.push(elements::Break::new(0.5));

        let image = elements::Image::from_dynamic_image(qr_image.clone())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
            .with_scale(genpdf::Scale::new(0.3, 0.3));
        doc.push(image);
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer)
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::StockableType;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn label() -> PrintedLabel {
        PrintedLabel {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            user_id: None,
            labelable_id: Uuid::new_v4(),
            labelable_type: StockableType::Ingredient,
            item_name: "Molho de tomate".into(),
            expiration_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            quantity_printed: 2,
            lot_number: Some("L042".into()),
            sif: None,
            weight: Some(Decimal::new(15, 1)),
            unit_of_measure: Some("kg".into()),
            print_date: Utc.with_ymd_and_hms(2026, 12, 1, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn lines_include_optional_fields() {
        let lines = label_lines(&label());
        assert_eq!(lines[0], "Fabricação: 01/12/2026 10:30");
        assert_eq!(lines[1], "Validade: 31/12/2026");
        assert!(lines.contains(&"Lote: L042".to_string()));
        assert!(lines.contains(&"Peso: 1.5 kg".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("SIF")));
    }

    #[test]
    fn qr_payload_identifies_label() {
        let label = label();
        let payload: serde_json::Value = serde_json::from_str(&label_qr_payload(&label)).unwrap();
        assert_eq!(payload["type"], "label");
        assert_eq!(payload["itemType"], "Ingredient");
        assert_eq!(payload["expirationDate"], "2026-12-31");
    }

    #[test]
    fn missing_font_dir_is_reported() {
        let result = render_label_pdf(&label(), "/caminho/inexistente");
        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }
}
