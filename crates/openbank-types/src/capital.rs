//! Bank Capital (§3): a process-wide singleton per bank.

use crate::error::{BankError, BankResult};
use crate::money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankCapital {
    pub bank_code: String,
    pub capital: Money,
    pub initial_capital: Money,
    pub total_deposits: Money,
    pub total_loans: Money,
}

impl BankCapital {
    /// §3 invariant: `capital >= 0` at all times. Callers apply deltas via
    /// `apply_delta` under a row lock (§5) rather than mutating `capital`
    /// directly.
    pub fn apply_delta(&mut self, delta: &Money) -> BankResult<()> {
        let next = self.capital.checked_add(delta)?;
        if next.is_negative() {
            return Err(BankError::InsufficientCapital);
        }
        self.capital = next;
        Ok(())
    }
}
