// src/services/qr_code_service.rs

use qrcode::{render::svg, EcLevel, QrCode as QrMatrix};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FeedbackRepository, QrCodeRepository, RestaurantRepository},
    models::{
        qr_code::{target_url, CreateQrCodePayload, QrCode, QrCodeStats, QrCodeType, QrScan, UpdateQrCodePayload},
        restaurant::Restaurant,
    },
    services::reward_service::first_free_code,
};

const SHORT_CODE_LEN: usize = 8;
const SHORT_CODE_ATTEMPTS: usize = 5;

const DEFAULT_IMAGE_SIZE: u32 = 256;
const MIN_IMAGE_SIZE: u32 = 128;
const MAX_IMAGE_SIZE: u32 = 1024;

/// Código curto e aleatório que identifica o QR code na URL.
pub fn short_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SHORT_CODE_LEN).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Tamanho do SVG pedido, limitado a uma faixa imprimível.
pub fn image_size(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_IMAGE_SIZE)
        .clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE)
}

/// SVG com a URL de destino; correção de erro alta para etiquetas de mesa gastas.
pub fn qr_svg(content: &str, size: u32) -> Result<String, AppError> {
    let code = QrMatrix::with_error_correction_level(content.as_bytes(), EcLevel::H)
        .map_err(|e| anyhow::anyhow!("Falha ao gerar QR code: {e}"))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(size, size)
        .build())
}

#[derive(Clone)]
pub struct QrCodeService {
    repo: QrCodeRepository,
    restaurant_repo: RestaurantRepository,
    feedback_repo: FeedbackRepository,
    public_base_url: String,
}

impl QrCodeService {
    pub fn new(
        repo: QrCodeRepository,
        restaurant_repo: RestaurantRepository,
        feedback_repo: FeedbackRepository,
        public_base_url: String,
    ) -> Self {
        Self {
            repo,
            restaurant_repo,
            feedback_repo,
            public_base_url,
        }
    }

    pub async fn create(
        &self,
        restaurant_id: Uuid,
        actor_id: Uuid,
        payload: &CreateQrCodePayload,
    ) -> Result<QrCode, AppError> {
        let restaurant = self
            .restaurant_repo
            .find_by_id(restaurant_id)
            .await?
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        let mut tx = self.repo.pool().begin().await?;

        let candidates: Vec<String> = {
            let mut rng = rand::thread_rng();
            (0..SHORT_CODE_ATTEMPTS).map(|_| short_code(&mut rng)).collect()
        };
        let taken = self.repo.taken_short_codes(&mut *tx, &candidates).await?;
        let code = first_free_code(candidates, &taken).ok_or(AppError::Conflict("qrcode.code_conflict"))?;

        // Check-in não aponta para mesa
        let table_number = payload.qr_type.needs_table().then_some(payload.table_number).flatten();
        let url = target_url(&self.public_base_url, payload.qr_type, &restaurant.slug, table_number, &code);

        let created = self
            .repo
            .insert(&mut *tx, restaurant_id, payload, &code, &url, actor_id)
            .await?;

        tx.commit().await?;

        tracing::info!(%restaurant_id, qr_code_id = %created.id, qr_type = ?created.qr_type, table = ?created.table_number, "QR code criado");
        Ok(created)
    }

    pub async fn list(&self, restaurant_id: Uuid, qr_type: Option<QrCodeType>) -> Result<Vec<QrCode>, AppError> {
        self.repo.list(restaurant_id, qr_type).await
    }

    pub async fn get(&self, restaurant_id: Uuid, id: Uuid) -> Result<QrCode, AppError> {
        self.repo
            .find_by_id(self.repo.pool(), restaurant_id, id)
            .await?
            .ok_or(AppError::NotFound("qrcode.not_found"))
    }

    /// Leituras, avaliações e nota média vindas deste QR code.
    pub async fn stats(&self, restaurant_id: Uuid, id: Uuid) -> Result<QrCodeStats, AppError> {
        let qr_code = self.get(restaurant_id, id).await?;
        let average_rating = self
            .feedback_repo
            .average_rating_for_qr_code(qr_code.id)
            .await?
            .map(|avg| (avg * 10.0).round() / 10.0);

        Ok(QrCodeStats {
            conversion_rate: qr_code.conversion_rate(),
            average_rating,
            qr_code,
        })
    }

    pub async fn update(&self, restaurant_id: Uuid, id: Uuid, payload: &UpdateQrCodePayload) -> Result<QrCode, AppError> {
        self.repo
            .update(restaurant_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("qrcode.not_found"))
    }

    pub async fn delete(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete(restaurant_id, id).await? {
            0 => Err(AppError::NotFound("qrcode.not_found")),
            _ => Ok(()),
        }
    }

    pub async fn image(&self, restaurant_id: Uuid, id: Uuid, size: Option<u32>) -> Result<String, AppError> {
        let qr_code = self.get(restaurant_id, id).await?;
        qr_svg(&qr_code.target_url, image_size(size))
    }

    /// Leitura pública: conta o acesso e devolve o destino.
    pub async fn scan(&self, short_code: &str) -> Result<QrScan, AppError> {
        let qr_code = self
            .repo
            .find_active_by_short_code(short_code)
            .await?
            .ok_or(AppError::NotFound("qrcode.not_found"))?;

        let restaurant = self
            .restaurant_repo
            .find_by_id(qr_code.restaurant_id)
            .await?
            .filter(Restaurant::is_public)
            .ok_or(AppError::NotFound("restaurant.not_found"))?;

        self.repo.record_scan(qr_code.id).await?;

        Ok(QrScan {
            qr_code_id: qr_code.id,
            qr_type: qr_code.qr_type,
            table_number: qr_code.table_number,
            restaurant_slug: restaurant.slug,
            target_url: qr_code.target_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn short_codes_are_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(11);
        let code = short_code(&mut rng);
        assert_eq!(code.len(), SHORT_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(code, short_code(&mut rng));
    }

    #[test]
    fn image_size_is_clamped() {
        assert_eq!(image_size(None), DEFAULT_IMAGE_SIZE);
        assert_eq!(image_size(Some(10)), MIN_IMAGE_SIZE);
        assert_eq!(image_size(Some(50_000)), MAX_IMAGE_SIZE);
        assert_eq!(image_size(Some(512)), 512);
    }

    #[test]
    fn svg_is_rendered_for_the_target_url() {
        let svg = qr_svg("https://app.exemplo.com/feedback/new?restaurant=cantina&qr=Ab12Cd34&table=4", 256).unwrap();
        assert!(svg.contains("<svg"));
    }
}
