// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_INVOICE_PREFIX: &str = "INV-";
pub const DEFAULT_CURRENCY: &str = "BRL";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    pub tenant_id: Uuid,
    pub business_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub currency: String,
    pub invoice_prefix: String,
    pub updated_at: DateTime<Utc>,
}

fn validate_invoice_prefix(prefix: &str) -> Result<(), ValidationError> {
    let valid_chars = prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '/' | '_'));

    if prefix.is_empty() || prefix.chars().count() > 16 || !valid_chars {
        let mut err = ValidationError::new("invoice_prefix");
        err.message = Some(
            "O prefixo deve ter de 1 a 16 caracteres (letras, números, '-', '/', '_').".into(),
        );
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub business_name: String,

    pub address: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub tax_id: Option<String>,

    #[validate(length(equal = 3, message = "A moeda deve ser um código ISO de 3 letras."))]
    pub currency: Option<String>,

    #[validate(custom(function = "validate_invoice_prefix"))]
    pub invoice_prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prefix: Option<&str>) -> UpdateSettingsRequest {
        UpdateSettingsRequest {
            business_name: "Mercearia Boa Vista".into(),
            address: None,
            phone: None,
            email: Some("contato@boavista.com".into()),
            tax_id: None,
            currency: Some("BRL".into()),
            invoice_prefix: prefix.map(str::to_string),
        }
    }

    #[test]
    fn accepts_common_prefixes() {
        assert!(request(Some("INV-")).validate().is_ok());
        assert!(request(Some("NF/2026/")).validate().is_ok());
        assert!(request(None).validate().is_ok());
    }

    #[test]
    fn rejects_bad_prefixes() {
        assert!(request(Some("")).validate().is_err());
        assert!(request(Some("com espaço")).validate().is_err());
        assert!(request(Some("ABCDEFGHIJKLMNOPQ")).validate().is_err());
    }

    #[test]
    fn rejects_bad_email() {
        let mut req = request(None);
        req.email = Some("não-é-email".into());
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
