// src/middleware/i18n.rs

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

pub const DEFAULT_LANGUAGE: &str = "pt";

// Nosso extrator de idioma
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_header(header_value: Option<&str>) -> Self {
        let lang = header_value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first() // Pega o primeiro idioma (ex: "pt-BR")
                    .map(|tag_string| {
                        // "pt-BR" -> "pt"
                        tag_string.split('-').next().unwrap_or(tag_string).to_lowercase()
                    })
            })
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Locale(lang)
    }

    // Para os extratores que rejeitam com mensagem traduzida
    pub fn from_parts(parts: &Parts) -> Self {
        let header_value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        Locale::from_header(header_value)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_parts(parts))
    }
}

// ---
// Catálogo de mensagens (pt é o idioma padrão; en como alternativa)
// ---
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", PT.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());
        Self { messages }
    }

    /// Traduz a chave. Idioma desconhecido cai no português; chave desconhecida volta como está.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| {
                self.messages
                    .get(DEFAULT_LANGUAGE)
                    .and_then(|catalog| catalog.get(key))
            })
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

const PT: &[(&str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos."),
    ("error.internal", "Ocorreu um erro inesperado."),
    ("error.too_many_requests", "Muitas requisições. Tente novamente mais tarde."),
    // Auth
    ("auth.email_already_exists", "Este e-mail já está em uso."),
    ("auth.invalid_credentials", "Credenciais inválidas."),
    ("auth.invalid_token", "Token de autenticação inválido ou ausente."),
    ("auth.token_revoked", "Token revogado. Faça login novamente."),
    ("auth.user_not_found", "Usuário não encontrado."),
    ("auth.account_disabled", "Conta desativada."),
    ("auth.account_locked", "Conta bloqueada temporariamente por excesso de tentativas."),
    // Restaurante
    ("restaurant.context_required", "Nenhum restaurante selecionado para esta requisição."),
    ("restaurant.not_found", "Restaurante não encontrado."),
    ("restaurant.inactive", "Restaurante inativo."),
    ("restaurant.subscription_expired", "A assinatura do restaurante expirou."),
    ("restaurant.access_denied", "Você não tem acesso a este restaurante."),
    ("restaurant.slug_already_exists", "Já existe um restaurante com este slug."),
    ("restaurant.superadmin_required", "Apenas administradores da plataforma podem realizar esta ação."),
    ("restaurant.owner_cannot_be_removed", "O proprietário não pode ser removido da equipe."),
    ("restaurant.staff_not_found", "Membro da equipe não encontrado."),
    ("restaurant.staff_already_exists", "Este usuário já faz parte da equipe."),
    ("restaurant.staff_data_required", "Nome e senha são obrigatórios para cadastrar um novo usuário."),
    // IAM
    ("permission.denied", "Você não tem permissão para realizar esta ação."),
    ("permission.feature_locked", "Este recurso não está disponível no plano do restaurante."),
    ("iam.feature_not_found", "Funcionalidade não encontrada."),
    ("iam.role_not_found", "Cargo não encontrado."),
    ("iam.role_already_exists", "Já existe um cargo com esta chave."),
    // Clientes
    ("customer.not_found", "Cliente não encontrado."),
    ("customer.already_exists", "Já existe um cliente com este telefone ou CPF."),
    ("feedback.not_found", "Avaliação não encontrada."),
    ("qrcode.not_found", "QR code não encontrado ou desativado."),
    ("qrcode.already_exists", "Já existe um QR code deste tipo para esta mesa."),
    ("qrcode.code_conflict", "Não foi possível gerar um código único. Tente novamente."),
    // Check-in
    ("checkin.already_active", "O cliente já possui um check-in ativo."),
    ("checkin.not_found", "Check-in ativo não encontrado."),
    ("checkin.phone_required", "Informe o telefone para fazer o check-in."),
    ("checkin.cpf_required", "Informe o CPF para fazer o check-in."),
    ("checkin.invalid_period", "Período inválido. Use 7d, 30d, 90d, 1y ou all."),
    ("checkin.coupon_required", "É necessário informar um cupom para fazer o check-in."),
    // Cardápio
    ("product.not_found", "Produto não encontrado."),
    ("product.invalid_price", "O preço deve ser maior ou igual a zero."),
    ("category.not_found", "Categoria não encontrada."),
    ("category.already_exists", "Já existe uma categoria com este nome."),
    ("ingredient.not_found", "Ingrediente não encontrado."),
    // Estoque
    ("stock.item_not_found", "Item de estoque não encontrado."),
    ("stock.insufficient", "Estoque insuficiente."),
    ("stock.invalid_quantity", "A quantidade deve ser maior que zero."),
    ("stock.invalid_min_level", "O estoque mínimo não pode ser negativo."),
    ("stock.invalid_type", "Tipo de item inválido. Use Product ou Ingredient."),
    // Etiquetas
    ("label.not_found", "Etiqueta não encontrada."),
    ("label.item_not_found", "Item da etiqueta não encontrado."),
    ("label.font_not_found", "Fonte para gerar a etiqueta não encontrada."),
    // Recompensas
    ("reward.not_found", "Recompensa não encontrada."),
    ("reward.invalid", "Recompensa inválida ou expirada."),
    ("reward.not_eligible", "Esta recompensa pertence a outro cliente."),
    ("reward.customer_limit_reached", "O cliente atingiu o limite de uso desta recompensa."),
    ("reward.wheel_empty", "A roleta não possui itens configurados."),
    ("reward.not_wheel", "Esta recompensa não é uma roleta."),
    ("reward.validity_out_of_range", "A validade informada está fora do intervalo permitido."),
    ("reward.spin_not_earned", "O cliente não tem um giro da roleta disponível."),
    ("reward.milestone_already_claimed", "A recompensa deste marco de visitas já foi concedida."),
    // Cupons
    ("coupon.not_found", "Cupom não encontrado."),
    ("coupon.not_redeemable", "Cupom já resgatado, cancelado ou expirado."),
    ("coupon.not_cancellable", "Cupom não pode ser cancelado."),
    ("coupon.code_conflict", "Não foi possível gerar um código de cupom único."),
    // Pesquisas
    ("survey.not_found", "Pesquisa não encontrada."),
    ("survey.question_not_found", "A pergunta não pertence a esta pesquisa."),
    ("survey.question_not_in_survey", "A pergunta não pertence a esta pesquisa."),
    ("survey.duplicate_answer", "A mesma pergunta foi respondida mais de uma vez."),
    ("survey.options_required", "Perguntas de múltipla escolha precisam de ao menos duas opções."),
    ("survey.invalid_nps", "A nota NPS deve estar entre 0 e 10."),
    ("survey.invalid_rating", "A avaliação deve estar entre 1 e 5."),
    ("survey.invalid_option", "A opção escolhida não existe nesta pergunta."),
    ("survey.required_answer_missing", "Responda todas as perguntas obrigatórias."),
    // Financeiro
    ("financial.category_not_found", "Categoria financeira não encontrada."),
    ("financial.invalid_amount", "O valor deve ser maior que zero."),
    ("financial.category_type_mismatch", "O tipo da categoria não corresponde ao tipo da transação."),
    ("financial.payment_method_not_found", "Forma de pagamento não encontrada."),
    ("financial.period_required", "Informe a data inicial e a data final."),
    ("financial.invalid_period", "A data inicial deve ser anterior ou igual à data final."),
    // Caixa
    ("cash_register.session_already_open", "Já existe um caixa aberto para este usuário."),
    ("cash_register.no_open_session", "Nenhum caixa aberto encontrado."),
    ("cash_register.session_not_found", "Sessão de caixa não encontrada."),
    ("cash_register.session_closed", "Esta sessão de caixa já foi fechada."),
    ("cash_register.invalid_amount", "Valor inválido para o caixa."),
    ("cash_register.invalid_category", "A categoria não corresponde ao tipo da movimentação."),
    // Chamadas
    ("waiter_call.not_found", "Chamada não encontrada."),
];

const EN: &[(&str, &str)] = &[
    ("error.validation", "One or more fields are invalid."),
    ("error.internal", "An unexpected error occurred."),
    ("error.too_many_requests", "Too many requests. Try again later."),
    ("auth.email_already_exists", "This e-mail is already in use."),
    ("auth.invalid_credentials", "Invalid credentials."),
    ("auth.invalid_token", "Invalid or missing authentication token."),
    ("auth.token_revoked", "Token revoked. Please log in again."),
    ("auth.user_not_found", "User not found."),
    ("auth.account_disabled", "Account disabled."),
    ("auth.account_locked", "Account temporarily locked after too many attempts."),
    ("restaurant.context_required", "No restaurant selected for this request."),
    ("restaurant.not_found", "Restaurant not found."),
    ("restaurant.inactive", "Restaurant is inactive."),
    ("restaurant.subscription_expired", "The restaurant subscription has expired."),
    ("restaurant.access_denied", "You do not have access to this restaurant."),
    ("restaurant.slug_already_exists", "A restaurant with this slug already exists."),
    ("restaurant.superadmin_required", "Only platform administrators can perform this action."),
    ("restaurant.owner_cannot_be_removed", "The owner cannot be removed from the staff."),
    ("restaurant.staff_not_found", "Staff member not found."),
    ("restaurant.staff_already_exists", "This user is already part of the staff."),
    ("restaurant.staff_data_required", "Name and password are required to create a new user."),
    ("permission.denied", "You are not allowed to perform this action."),
    ("permission.feature_locked", "This feature is not available in the restaurant plan."),
    ("iam.feature_not_found", "Feature not found."),
    ("iam.role_not_found", "Role not found."),
    ("iam.role_already_exists", "A role with this key already exists."),
    ("customer.not_found", "Customer not found."),
    ("customer.already_exists", "A customer with this phone or CPF already exists."),
    ("feedback.not_found", "Feedback not found."),
    ("qrcode.not_found", "QR code not found or disabled."),
    ("qrcode.already_exists", "A QR code of this type already exists for this table."),
    ("qrcode.code_conflict", "Could not generate a unique code. Please try again."),
    ("checkin.already_active", "The customer already has an active check-in."),
    ("checkin.not_found", "Active check-in not found."),
    ("checkin.phone_required", "Phone is required to check in."),
    ("checkin.cpf_required", "CPF is required to check in."),
    ("checkin.invalid_period", "Invalid period. Use 7d, 30d, 90d, 1y or all."),
    ("checkin.coupon_required", "A coupon is required to check in."),
    ("product.not_found", "Product not found."),
    ("product.invalid_price", "Price must be zero or greater."),
    ("category.not_found", "Category not found."),
    ("category.already_exists", "A category with this name already exists."),
    ("ingredient.not_found", "Ingredient not found."),
    ("stock.item_not_found", "Stock item not found."),
    ("stock.insufficient", "Insufficient stock."),
    ("stock.invalid_quantity", "Quantity must be greater than zero."),
    ("stock.invalid_min_level", "Minimum stock level cannot be negative."),
    ("stock.invalid_type", "Invalid item type. Use Product or Ingredient."),
    ("label.not_found", "Label not found."),
    ("label.item_not_found", "Label item not found."),
    ("label.font_not_found", "Font to render the label was not found."),
    ("reward.not_found", "Reward not found."),
    ("reward.invalid", "Reward is invalid or expired."),
    ("reward.not_eligible", "This reward belongs to another customer."),
    ("reward.customer_limit_reached", "The customer reached the usage limit for this reward."),
    ("reward.wheel_empty", "The wheel has no configured items."),
    ("reward.not_wheel", "This reward is not a wheel."),
    ("reward.validity_out_of_range", "The informed validity is out of the allowed range."),
    ("reward.spin_not_earned", "The customer has no wheel spin available."),
    ("reward.milestone_already_claimed", "The reward for this visit milestone was already granted."),
    ("coupon.not_found", "Coupon not found."),
    ("coupon.not_redeemable", "Coupon already redeemed, cancelled or expired."),
    ("coupon.not_cancellable", "Coupon cannot be cancelled."),
    ("coupon.code_conflict", "Could not generate a unique coupon code."),
    ("survey.not_found", "Survey not found."),
    ("survey.question_not_found", "The question does not belong to this survey."),
    ("survey.question_not_in_survey", "The question does not belong to this survey."),
    ("survey.duplicate_answer", "The same question was answered more than once."),
    ("survey.options_required", "Multiple choice questions need at least two options."),
    ("survey.invalid_nps", "NPS score must be between 0 and 10."),
    ("survey.invalid_rating", "Rating must be between 1 and 5."),
    ("survey.invalid_option", "The chosen option does not exist for this question."),
    ("survey.required_answer_missing", "Answer every required question."),
    ("financial.category_not_found", "Financial category not found."),
    ("financial.invalid_amount", "Amount must be greater than zero."),
    ("financial.category_type_mismatch", "Category type does not match the transaction type."),
    ("financial.payment_method_not_found", "Payment method not found."),
    ("financial.period_required", "Start date and end date are required."),
    ("financial.invalid_period", "Start date must not be after end date."),
    ("cash_register.session_already_open", "There is already an open cash register for this user."),
    ("cash_register.no_open_session", "No open cash register found."),
    ("cash_register.session_not_found", "Cash register session not found."),
    ("cash_register.session_closed", "This cash register session is already closed."),
    ("cash_register.invalid_amount", "Invalid cash register amount."),
    ("cash_register.invalid_category", "The category does not match the movement type."),
    ("waiter_call.not_found", "Call not found."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_takes_primary_language_tag() {
        assert_eq!(Locale::from_header(Some("en-US,en;q=0.9,pt;q=0.8")).0, "en");
        assert_eq!(Locale::from_header(Some("pt-BR")).0, "pt");
        assert_eq!(Locale::from_header(None).0, DEFAULT_LANGUAGE);
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "coupon.not_found"), "Cupom não encontrado.");
    }

    #[test]
    fn unknown_key_is_returned_as_is() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "chave.inexistente"), "chave.inexistente");
    }

    #[test]
    fn every_portuguese_key_has_an_english_translation() {
        let en: std::collections::HashSet<&str> = EN.iter().map(|(k, _)| *k).collect();
        for (key, _) in PT {
            assert!(en.contains(key), "sem tradução em inglês: {key}");
        }
    }
}
