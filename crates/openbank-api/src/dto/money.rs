//! Wire shape for `Money`: a decimal-string amount plus an ISO currency
//! code, rather than `Money`'s internal cents/enum representation.

use openbank_types::{BankError, BankResult, Currency, Money};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoneyDto {
    #[schema(example = "250.00")]
    pub amount: String,
    #[schema(example = "RUB")]
    pub currency: String,
}

impl MoneyDto {
    pub fn from_domain(money: Money) -> Self {
        Self {
            amount: money.to_decimal().to_string(),
            currency: money.currency().code().to_string(),
        }
    }

    pub fn into_domain(self) -> BankResult<Money> {
        let currency = Currency::parse(&self.currency)
            .ok_or_else(|| BankError::validation(format!("unknown currency code: {}", self.currency)))?;
        let decimal = self
            .amount
            .parse()
            .map_err(|_| BankError::validation(format!("invalid amount: {}", self.amount)))?;
        Money::from_major(decimal, currency)
    }
}
