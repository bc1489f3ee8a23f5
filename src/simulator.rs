use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountLedger};
use crate::dates::add_months;
use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{
    AccountPayoff, MonthlyBreakdown, SimulationOutcome, Strategy, DEFAULT_MONTH_CAP,
};

/// combined payoff projection for a set of accounts under one strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy: Strategy,
    pub outcome: SimulationOutcome,
    pub total_months: u32,
    pub total_interest: Money,
    pub effective_payment: Money,
    /// None when the run did not converge
    pub payoff_date: Option<NaiveDate>,
    pub account_payoffs: Vec<AccountPayoff>,
    pub schedule: Vec<MonthlyBreakdown>,
}

impl SimulationResult {
    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// multi-account payoff simulator
///
/// Applies minimum payments first, then the surplus according to the chosen
/// strategy. A payment below the sum of minimums is not rejected; the run
/// simply fails to converge and the tagged outcome says so.
pub struct StrategySimulator;

impl StrategySimulator {
    pub fn simulate(
        accounts: &[Account],
        monthly_payment: Money,
        strategy: Strategy,
        start_date: NaiveDate,
    ) -> Result<SimulationResult> {
        let mut ledger = AccountLedger::new(accounts)?;

        // snowball/avalanche fix their queue once at the start
        let order = priority_order(&ledger, strategy);

        let mut schedule = Vec::new();
        let mut cumulative_interest = Money::ZERO;
        let mut month = 0;

        while !ledger.all_paid_off() && month < DEFAULT_MONTH_CAP {
            month += 1;
            let starting_balance = ledger.total_balance();

            let mut interest_total = Money::ZERO;
            let mut purchases_total = Money::ZERO;
            for index in 0..ledger.len() {
                interest_total += ledger.accrue_interest(index);
                purchases_total += ledger.add_purchases(index);
            }

            let applied_total = match strategy {
                Strategy::Snowball | Strategy::Avalanche => {
                    apply_ordered(&mut ledger, &order, monthly_payment, month)
                }
                Strategy::Simultaneous => {
                    apply_proportional(&mut ledger, monthly_payment, month)
                }
            };

            cumulative_interest += interest_total;
            schedule.push(MonthlyBreakdown {
                month,
                starting_balance,
                payment_applied: applied_total,
                interest_accrued: interest_total,
                principal_paid: applied_total - interest_total,
                purchases_added: purchases_total,
                ending_balance: ledger.total_balance(),
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

        Ok(SimulationResult {
            strategy,
            outcome,
            total_months: month,
            total_interest: cumulative_interest,
            effective_payment: monthly_payment,
            payoff_date: outcome
                .is_converged()
                .then(|| add_months(start_date, month)),
            account_payoffs: ledger.account_payoffs(),
            schedule,
        })
    }
}

/// fixed priority queue for snowball/avalanche, captured before the first tick
fn priority_order(ledger: &AccountLedger, strategy: Strategy) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ledger.len()).collect();
    match strategy {
        Strategy::Snowball => {
            order.sort_by(|&a, &b| ledger.balance(a).cmp(&ledger.balance(b)));
        }
        Strategy::Avalanche => {
            order.sort_by(|&a, &b| ledger.apr(b).cmp(&ledger.apr(a)));
        }
        Strategy::Simultaneous => {}
    }
    order
}

/// minimums across the queue, then the whole surplus to the first unpaid
/// account, cascading to the next when one settles mid-month
fn apply_ordered(
    ledger: &mut AccountLedger,
    order: &[usize],
    monthly_payment: Money,
    month: u32,
) -> Money {
    let mut available = monthly_payment;
    let mut applied_total = Money::ZERO;

    for &index in order {
        if !ledger.is_active(index) || !available.is_positive() {
            continue;
        }
        let minimum = ledger.minimum_payment(index).min(available);
        let applied = ledger.apply_payment(index, minimum, month);
        available -= applied;
        applied_total += applied;
    }

    for &index in order {
        if !available.is_positive() {
            break;
        }
        if !ledger.is_active(index) {
            continue;
        }
        let applied = ledger.apply_payment(index, available, month);
        available -= applied;
        applied_total += applied;
    }

    applied_total
}

/// each active account receives its current balance share of the payment;
/// shares are recomputed from live balances every month, never fixed at t=0
fn apply_proportional(
    ledger: &mut AccountLedger,
    monthly_payment: Money,
    month: u32,
) -> Money {
    let active = ledger.active_indices();
    let total: Money = active.iter().map(|&i| ledger.balance(i)).sum();
    if !total.is_positive() {
        return Money::ZERO;
    }

    let mut applied_total = Money::ZERO;
    for &index in &active {
        let share = Money::from_decimal(
            monthly_payment.as_decimal() * ledger.balance(index).as_decimal()
                / total.as_decimal(),
        );
        applied_total += ledger.apply_payment(index, share, month);
    }
    applied_total
}

/// run all three strategies over the same inputs for side-by-side comparison;
/// each run is independent and takes its own snapshot of the accounts
pub fn compare_strategies(
    accounts: &[Account],
    monthly_payment: Money,
    start_date: NaiveDate,
) -> Result<StrategyComparison> {
    Ok(StrategyComparison {
        snowball: StrategySimulator::simulate(
            accounts,
            monthly_payment,
            Strategy::Snowball,
            start_date,
        )?,
        avalanche: StrategySimulator::simulate(
            accounts,
            monthly_payment,
            Strategy::Avalanche,
            start_date,
        )?,
        simultaneous: StrategySimulator::simulate(
            accounts,
            monthly_payment,
            Strategy::Simultaneous,
            start_date,
        )?,
    })
}

/// the same inputs under all three strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub snowball: SimulationResult,
    pub avalanche: SimulationResult,
    pub simultaneous: SimulationResult,
}

impl StrategyComparison {
    /// converged result paying the least total interest, if any converged
    pub fn least_interest(&self) -> Option<&SimulationResult> {
        [&self.snowball, &self.avalanche, &self.simultaneous]
            .into_iter()
            .filter(|r| r.outcome.is_converged())
            .min_by_key(|r| r.total_interest)
    }
}
