use rust_decimal::{Decimal, RoundingStrategy};
use validator::ValidationError;

// Escalas das colunas NUMERIC(14, 2) (valores) e NUMERIC(14, 3) (quantidades)
pub const MONEY_SCALE: u32 = 2;
pub const QUANTITY_SCALE: u32 = 3;
pub const RATE_SCALE: u32 = 2;

/// Maior valor que cabe em NUMERIC(14, 2).
pub fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, MONEY_SCALE)
}

/// Maior quantidade que cabe em NUMERIC(14, 3).
pub fn max_quantity() -> Decimal {
    Decimal::new(99_999_999_999_999, QUANTITY_SCALE)
}

/// Arredonda para centavos (meio para longe do zero, como na nota impressa).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `Some` só se o valor couber na coluna de valores.
pub fn fit_money(value: Decimal) -> Option<Decimal> {
    (value.abs() <= max_money()).then_some(value)
}

// ---
// Validações Customizadas (valores do payload x colunas do banco)
// ---

fn range_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("range");
    err.message = Some(message.into());
    err
}

fn check_column(
    val: &Decimal,
    scale: u32,
    max: Decimal,
    allow_zero: bool,
    too_big: &'static str,
) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        return Err(range_error("O valor não pode ser negativo."));
    }
    if !allow_zero && val.is_zero() {
        return Err(range_error("O valor deve ser maior que zero."));
    }
    if val.normalize().scale() > scale {
        let mut err = ValidationError::new("precision");
        err.message = Some(format!("Use no máximo {} casas decimais.", scale).into());
        return Err(err);
    }
    if *val > max {
        return Err(range_error(too_big));
    }
    Ok(())
}

pub(crate) fn validate_money(val: &Decimal) -> Result<(), ValidationError> {
    check_column(val, MONEY_SCALE, max_money(), true, "Valor acima do limite permitido.")
}

pub(crate) fn validate_positive_money(val: &Decimal) -> Result<(), ValidationError> {
    check_column(val, MONEY_SCALE, max_money(), false, "Valor acima do limite permitido.")
}

pub(crate) fn validate_quantity(val: &Decimal) -> Result<(), ValidationError> {
    check_column(val, QUANTITY_SCALE, max_quantity(), false, "Quantidade acima do limite permitido.")
}

pub(crate) fn validate_stock_quantity(val: &Decimal) -> Result<(), ValidationError> {
    check_column(val, QUANTITY_SCALE, max_quantity(), true, "Quantidade acima do limite permitido.")
}

pub(crate) fn validate_tax_rate(val: &Decimal) -> Result<(), ValidationError> {
    check_column(val, RATE_SCALE, Decimal::ONE_HUNDRED, true, "A alíquota deve estar entre 0 e 100.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(d("2.345")), d("2.35"));
        assert_eq!(round_money(d("2.344")), d("2.34"));
        assert_eq!(round_money(d("-2.345")), d("-2.35"));
    }

    #[test]
    fn limits_match_the_columns() {
        assert_eq!(max_money(), d("999999999999.99"));
        assert_eq!(max_quantity(), d("99999999999.999"));
        assert_eq!(fit_money(d("999999999999.99")), Some(d("999999999999.99")));
        assert_eq!(fit_money(d("1000000000000")), None);
    }

    #[test]
    fn money_rejects_sub_cent_values() {
        assert!(validate_positive_money(&d("0.001")).is_err());
        assert!(validate_positive_money(&d("0.01")).is_ok());
        assert!(validate_money(&d("19.999")).is_err());
        // zeros à direita não contam como casas decimais
        assert!(validate_money(&d("19.900")).is_ok());
        assert!(validate_money(&Decimal::ZERO).is_ok());
        assert!(validate_positive_money(&Decimal::ZERO).is_err());
        assert!(validate_money(&d("-0.01")).is_err());
    }

    #[test]
    fn quantities_keep_three_places() {
        assert!(validate_quantity(&d("0.001")).is_ok());
        assert!(validate_quantity(&d("0.0001")).is_err());
        assert!(validate_quantity(&Decimal::ZERO).is_err());
        assert!(validate_stock_quantity(&Decimal::ZERO).is_ok());
    }

    #[test]
    fn huge_values_are_rejected_not_stored() {
        let huge = d("100000000000000000000");
        assert!(validate_money(&huge).is_err());
        assert!(validate_quantity(&huge).is_err());
        assert!(validate_tax_rate(&d("100.01")).is_err());
        assert!(validate_tax_rate(&d("12.5")).is_ok());
        assert!(validate_tax_rate(&d("12.555")).is_err());
    }
}
