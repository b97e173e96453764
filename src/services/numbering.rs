// src/services/numbering.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InvoiceRepository, SettingsRepository},
};

/// Largura mínima do sequencial; números maiores não são truncados.
pub const SEQUENCE_WIDTH: usize = 4;

pub fn format_invoice_number(prefix: &str, sequence: i64) -> String {
    format!("{}{:0>width$}", prefix, sequence, width = SEQUENCE_WIDTH)
}

/// Próximo número de fatura da loja, alocado dentro da transação do chamador.
/// Se a transação for desfeita, o número também volta.
///
/// Depois de uma troca de prefixo o número formatado pode coincidir com uma
/// fatura antiga ("INV-1" + 0001 = "INV-10001"); nesse caso o sequencial avança.
/// A linha do contador fica travada até o commit, então a checagem não disputa
/// com outra emissão da mesma loja.
pub async fn next_invoice_number(
    invoice_repo: &InvoiceRepository,
    settings_repo: &SettingsRepository,
    conn: &mut PgConnection,
    tenant_id: Uuid,
) -> Result<String, AppError> {
    let prefix = settings_repo.get_invoice_prefix(&mut *conn, tenant_id).await?;

    loop {
        let sequence = invoice_repo.next_sequence(&mut *conn, tenant_id).await?;
        let number = format_invoice_number(&prefix, sequence);

        if !invoice_repo.number_taken(&mut *conn, tenant_id, &number).await? {
            return Ok(number);
        }
        tracing::debug!(%tenant_id, %number, "Número de fatura já usado, avançando o sequencial");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_four_digits() {
        assert_eq!(format_invoice_number("INV-", 1), "INV-0001");
        assert_eq!(format_invoice_number("INV-", 7), "INV-0007");
        assert_eq!(format_invoice_number("NF/2026/", 123), "NF/2026/0123");
    }

    #[test]
    fn wide_sequences_are_not_truncated() {
        assert_eq!(format_invoice_number("INV-", 9999), "INV-9999");
        assert_eq!(format_invoice_number("INV-", 12345), "INV-12345");
    }
}
