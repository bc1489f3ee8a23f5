use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::account::{Account, AccountLedger};
use crate::dates::add_months;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::types::{
    MonthlyBreakdown, SimulationOutcome, DEFAULT_MONTH_CAP, MAX_MONTH_CAP,
};

/// single-account amortization schedule under a fixed monthly payment
#[derive(Debug, Clone)]
pub struct AmortizationProjection {
    pub account_id: uuid::Uuid,
    pub monthly_payment: Money,
    pub start_date: NaiveDate,
    pub outcome: SimulationOutcome,
    pub schedule: Vec<MonthlyBreakdown>,
    pub total_interest: Money,
    pub total_paid: Money,
    /// start date plus months to payoff; None when the cap was hit
    pub payoff_date: Option<NaiveDate>,
}

impl AmortizationProjection {
    /// project with the default 600-month cap
    pub fn generate(
        account: &Account,
        monthly_payment: Money,
        start_date: NaiveDate,
    ) -> Result<Self> {
        Self::generate_with_cap(account, monthly_payment, start_date, DEFAULT_MONTH_CAP)
    }

    /// project month by month until payoff or the safety cap
    ///
    /// Each tick accrues interest, adds recurring purchases, then applies
    /// the capped payment, the same intra-month order as the multi-account
    /// simulators. Pure function of its inputs; a fresh call regenerates
    /// the identical sequence.
    pub fn generate_with_cap(
        account: &Account,
        monthly_payment: Money,
        start_date: NaiveDate,
        max_months: u32,
    ) -> Result<Self> {
        let cap = max_months.min(MAX_MONTH_CAP);
        let mut ledger = AccountLedger::new(std::slice::from_ref(account))?;

        let mut schedule = Vec::new();
        let mut cumulative_interest = Money::ZERO;
        let mut total_paid = Money::ZERO;
        let mut month = 0;

        while !ledger.all_paid_off() && month < cap {
            month += 1;
            let starting_balance = ledger.balance(0);

            let interest = ledger.accrue_interest(0);
            let purchases = ledger.add_purchases(0);
            let applied = ledger.apply_payment(0, monthly_payment, month);

            cumulative_interest += interest;
            total_paid += applied;

            schedule.push(MonthlyBreakdown {
                month,
                starting_balance,
                payment_applied: applied,
                interest_accrued: interest,
                principal_paid: applied - interest,
                purchases_added: purchases,
                ending_balance: ledger.balance(0),
                cumulative_interest,
            });
        }

        let outcome = if ledger.all_paid_off() {
            SimulationOutcome::Converged { months: month }
        } else {
            SimulationOutcome::DidNotConverge {
                months_simulated: month,
            }
        };

        Ok(Self {
            account_id: account.id,
            monthly_payment,
            start_date,
            outcome,
            schedule,
            total_interest: cumulative_interest,
            total_paid,
            payoff_date: outcome
                .is_converged()
                .then(|| add_months(start_date, outcome.months())),
        })
    }
}

/// closed-form annuity payment for a fixed-term payoff
///
/// PMT = P * r * (1 + r)^n / ((1 + r)^n - 1)
pub fn payment_for_term(balance: Money, annual_rate: Rate, months: u32) -> Money {
    if months == 0 {
        return balance;
    }

    let monthly_rate = annual_rate.as_decimal() / dec!(12);
    if monthly_rate.is_zero() {
        return Money::from_decimal_ceil(balance.as_decimal() / Decimal::from(months));
    }

    let mut compound = Decimal::ONE;
    let base = Decimal::ONE + monthly_rate;
    for _ in 0..months {
        compound *= base;
    }

    let numerator = balance.as_decimal() * monthly_rate * compound;
    let denominator = compound - Decimal::ONE;
    // round up so the plan pays off at or before the term
    Money::from_decimal_ceil(numerator / denominator)
}

/// months to payoff under a fixed payment, capped at the default month cap
pub fn term_for_payment(balance: Money, annual_rate: Rate, payment: Money) -> SimulationOutcome {
    let mut remaining = balance;
    let mut months = 0;

    while remaining > Money::EPSILON && months < DEFAULT_MONTH_CAP {
        let interest = remaining.monthly_interest(annual_rate);
        if payment <= interest {
            // payment never touches principal
            return SimulationOutcome::DidNotConverge {
                months_simulated: DEFAULT_MONTH_CAP,
            };
        }
        let accrued = remaining + interest;
        let applied = payment.min(accrued);
        remaining = (accrued - applied).max(Money::ZERO);
        months += 1;
    }

    if remaining <= Money::EPSILON {
        SimulationOutcome::Converged { months }
    } else {
        SimulationOutcome::DidNotConverge {
            months_simulated: months,
        }
    }
}
