use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{PayoffError, Result};
use crate::types::{AccountId, AccountPayoff, AccountStatus};

/// credit-card-like debt account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub balance: Money,
    /// annual percentage rate
    pub apr: Rate,
    pub minimum_payment: Money,
    /// recurring spend added back to the balance each month while active
    pub monthly_purchases: Money,
    /// informational only, never enforced by the engine
    pub credit_limit: Money,
    pub due_day: Option<u8>,
}

impl Account {
    pub fn new(name: impl Into<String>, balance: Money, apr: Rate, minimum_payment: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            balance,
            apr,
            minimum_payment,
            monthly_purchases: Money::ZERO,
            credit_limit: Money::ZERO,
            due_day: None,
        }
    }

    pub fn with_purchases(mut self, monthly_purchases: Money) -> Self {
        self.monthly_purchases = monthly_purchases;
        self
    }

    pub fn with_credit_limit(mut self, credit_limit: Money) -> Self {
        self.credit_limit = credit_limit;
        self
    }

    pub fn with_due_day(mut self, due_day: u8) -> Self {
        self.due_day = Some(due_day);
        self
    }

    /// reject negative balances, rates, and payments before simulation
    pub fn validate(&self) -> Result<()> {
        if self.balance.is_negative() {
            return Err(PayoffError::InvalidAccount {
                name: self.name.clone(),
                message: format!("negative balance {}", self.balance),
            });
        }
        if self.apr.is_negative() {
            return Err(PayoffError::InvalidInterestRate { rate: self.apr });
        }
        if self.minimum_payment.is_negative() {
            return Err(PayoffError::InvalidAccount {
                name: self.name.clone(),
                message: format!("negative minimum payment {}", self.minimum_payment),
            });
        }
        if self.monthly_purchases.is_negative() {
            return Err(PayoffError::InvalidAccount {
                name: self.name.clone(),
                message: format!("negative monthly purchases {}", self.monthly_purchases),
            });
        }
        if let Some(day) = self.due_day {
            if day == 0 || day > 31 {
                return Err(PayoffError::InvalidAccount {
                    name: self.name.clone(),
                    message: format!("due day {day} out of range"),
                });
            }
        }
        Ok(())
    }
}

/// per-account mutable state for one simulation run
#[derive(Debug, Clone)]
struct AccountSlot {
    id: AccountId,
    name: String,
    balance: Money,
    apr: Rate,
    minimum_payment: Money,
    monthly_purchases: Money,
    status: AccountStatus,
    interest_accrued: Money,
    payoff_month: Option<u32>,
    payoff_order: Option<u32>,
}

/// indexed ledger of account state for the duration of one simulation call
///
/// Accounts are addressed by their position in the input slice. All balance
/// mutation goes through the ledger so the payoff transition fires exactly
/// once per account.
#[derive(Debug, Clone)]
pub struct AccountLedger {
    slots: Vec<AccountSlot>,
    paid_off_count: u32,
}

impl AccountLedger {
    /// snapshot immutable account inputs into mutable simulation state
    pub fn new(accounts: &[Account]) -> Result<Self> {
        if accounts.is_empty() {
            return Err(PayoffError::EmptyAccountSet);
        }
        for account in accounts {
            account.validate()?;
        }

        let slots = accounts
            .iter()
            .map(|a| AccountSlot {
                id: a.id,
                name: a.name.clone(),
                balance: a.balance,
                apr: a.apr,
                minimum_payment: a.minimum_payment,
                monthly_purchases: a.monthly_purchases,
                status: AccountStatus::Active,
                interest_accrued: Money::ZERO,
                payoff_month: None,
                payoff_order: None,
            })
            .collect::<Vec<_>>();

        let mut ledger = Self {
            slots,
            paid_off_count: 0,
        };
        // accounts opened at zero are settled before the first tick
        for index in 0..ledger.len() {
            ledger.mark_if_paid_off(index, 0);
        }
        Ok(ledger)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.slots[index].status == AccountStatus::Active
    }

    pub fn balance(&self, index: usize) -> Money {
        self.slots[index].balance
    }

    pub fn apr(&self, index: usize) -> Rate {
        self.slots[index].apr
    }

    pub fn minimum_payment(&self, index: usize) -> Money {
        self.slots[index].minimum_payment
    }

    pub fn total_balance(&self) -> Money {
        self.slots.iter().map(|s| s.balance).sum()
    }

    pub fn total_interest(&self) -> Money {
        self.slots.iter().map(|s| s.interest_accrued).sum()
    }

    pub fn all_paid_off(&self) -> bool {
        self.slots.iter().all(|s| s.status == AccountStatus::PaidOff)
    }

    /// indices of accounts still carrying a balance
    pub fn active_indices(&self) -> Vec<usize> {
        (0..self.slots.len()).filter(|&i| self.is_active(i)).collect()
    }

    /// accrue one month of interest; returns the interest added
    pub fn accrue_interest(&mut self, index: usize) -> Money {
        let slot = &mut self.slots[index];
        if slot.status != AccountStatus::Active {
            return Money::ZERO;
        }
        let interest = slot.balance.monthly_interest(slot.apr);
        slot.balance += interest;
        slot.interest_accrued += interest;
        interest
    }

    /// add the month's recurring purchases; returns the amount added
    pub fn add_purchases(&mut self, index: usize) -> Money {
        let slot = &mut self.slots[index];
        if slot.status != AccountStatus::Active || !slot.monthly_purchases.is_positive() {
            return Money::ZERO;
        }
        slot.balance += slot.monthly_purchases;
        slot.monthly_purchases
    }

    /// pay toward one account, capped at its balance; marks payoff when settled.
    /// Returns the amount actually applied.
    pub fn apply_payment(&mut self, index: usize, amount: Money, month: u32) -> Money {
        if !self.is_active(index) || !amount.is_positive() {
            return Money::ZERO;
        }
        let applied = amount.min(self.slots[index].balance);
        self.slots[index].balance -= applied;
        self.mark_if_paid_off(index, month);
        applied
    }

    fn mark_if_paid_off(&mut self, index: usize, month: u32) {
        let needs_mark = {
            let slot = &self.slots[index];
            slot.status == AccountStatus::Active && slot.balance <= Money::EPSILON
        };
        if needs_mark {
            self.paid_off_count += 1;
            let order = self.paid_off_count;
            let slot = &mut self.slots[index];
            slot.balance = Money::ZERO;
            slot.status = AccountStatus::PaidOff;
            slot.payoff_month = Some(month);
            slot.payoff_order = Some(order);
        }
    }

    /// terminal per-account details
    pub fn account_payoffs(&self) -> Vec<AccountPayoff> {
        self.slots
            .iter()
            .map(|s| AccountPayoff {
                account_id: s.id,
                account_name: s.name.clone(),
                payoff_month: s.payoff_month,
                payoff_order: s.payoff_order,
                total_interest: s.interest_accrued,
                status: s.status,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn card(balance: i64, apr: u32, minimum: i64) -> Account {
        Account::new(
            format!("card-{balance}"),
            Money::from_major(balance),
            Rate::from_percentage(apr),
            Money::from_major(minimum),
        )
    }

    #[test]
    fn test_validate_rejects_negative_balance() {
        let mut account = card(1_000, 20, 25);
        account.balance = Money::from_decimal(dec!(-1));
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_due_day() {
        let account = card(1_000, 20, 25).with_due_day(32);
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_ledger_rejects_empty_set() {
        assert!(matches!(
            AccountLedger::new(&[]),
            Err(PayoffError::EmptyAccountSet)
        ));
    }

    #[test]
    fn test_accrual_and_payment() {
        let accounts = vec![card(5_000, 20, 100)];
        let mut ledger = AccountLedger::new(&accounts).unwrap();

        let interest = ledger.accrue_interest(0);
        assert_eq!(interest, Money::from_str_exact("83.33").unwrap());
        assert_eq!(ledger.balance(0), Money::from_str_exact("5083.33").unwrap());

        let applied = ledger.apply_payment(0, Money::from_major(500), 1);
        assert_eq!(applied, Money::from_major(500));
        assert_eq!(ledger.balance(0), Money::from_str_exact("4583.33").unwrap());
        assert!(ledger.is_active(0));
    }

    #[test]
    fn test_payment_capped_at_balance_and_marks_payoff() {
        let accounts = vec![card(100, 0, 25)];
        let mut ledger = AccountLedger::new(&accounts).unwrap();

        let applied = ledger.apply_payment(0, Money::from_major(500), 3);
        assert_eq!(applied, Money::from_major(100));
        assert_eq!(ledger.balance(0), Money::ZERO);
        assert!(!ledger.is_active(0));

        let payoffs = ledger.account_payoffs();
        assert_eq!(payoffs[0].payoff_month, Some(3));
        assert_eq!(payoffs[0].payoff_order, Some(1));
        assert_eq!(payoffs[0].status, AccountStatus::PaidOff);
    }

    #[test]
    fn test_paid_off_is_terminal() {
        let accounts = vec![card(50, 24, 10).with_purchases(Money::from_major(200))];
        let mut ledger = AccountLedger::new(&accounts).unwrap();

        ledger.apply_payment(0, Money::from_major(100), 1);
        assert!(!ledger.is_active(0));

        // purchases and interest stop once paid off
        assert_eq!(ledger.add_purchases(0), Money::ZERO);
        assert_eq!(ledger.accrue_interest(0), Money::ZERO);
        assert_eq!(ledger.balance(0), Money::ZERO);
    }

    #[test]
    fn test_residual_under_epsilon_counts_as_paid() {
        let accounts = vec![card(100, 0, 10)];
        let mut ledger = AccountLedger::new(&accounts).unwrap();

        ledger.apply_payment(0, Money::from_str_exact("99.99").unwrap(), 2);
        // one cent left, clamped to zero
        assert!(!ledger.is_active(0));
        assert_eq!(ledger.balance(0), Money::ZERO);
    }

    #[test]
    fn test_zero_balance_account_settles_immediately() {
        let accounts = vec![card(0, 20, 25), card(1_000, 20, 25)];
        let ledger = AccountLedger::new(&accounts).unwrap();

        assert!(!ledger.is_active(0));
        assert!(ledger.is_active(1));
        assert_eq!(ledger.account_payoffs()[0].payoff_month, Some(0));
    }
}
