use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountLedger};
use crate::dates::add_months;
use crate::decimal::Money;
use crate::errors::{PayoffError, Result};
use crate::scenario::{EventKind, FinancialEvent, PaymentPlan, PaymentScenario};
use crate::types::{
    AccountPayoff, MonthlyBreakdown, SimulationOutcome, DEFAULT_MONTH_CAP,
};

/// terminal output of an event-driven simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: PaymentScenario,
    pub outcome: SimulationOutcome,
    pub total_months: u32,
    pub total_interest: Money,
    /// monthly payment in effect when the simulation ended
    pub effective_payment: Money,
    /// None when the run did not converge
    pub payoff_date: Option<NaiveDate>,
    pub account_payoffs: Vec<AccountPayoff>,
    pub schedule: Vec<MonthlyBreakdown>,
    /// net recurring income minus expenses per month; bookkeeping only,
    /// never folded into the applied payment
    pub monthly_net_cash_flow: Vec<Money>,
}

impl ScenarioResult {
    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// flat summary of a scenario run for the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioView {
    pub scenario_name: String,
    pub converged: bool,
    pub total_months: u32,
    pub total_interest: Money,
    pub effective_payment: Money,
    pub payoff_date: Option<NaiveDate>,
}

impl ScenarioView {
    pub fn from_result(result: &ScenarioResult) -> Self {
        Self {
            scenario_name: result.scenario.name.clone(),
            converged: result.outcome.is_converged(),
            total_months: result.total_months,
            total_interest: result.total_interest,
            effective_payment: result.effective_payment,
            payoff_date: result.payoff_date,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// recurring cash-flow entry opened by an `IncomeStart`/`ExpenseStart` event
#[derive(Debug, Clone, Copy)]
struct RecurringFlow {
    /// signed monthly adjustment: income positive, expense negative
    amount: Money,
    end_month: Option<u32>,
}

/// event-driven scenario simulator
///
/// Replays the account set month by month while the scenario's event
/// timeline mutates the payment amount and the available-cash ledger.
/// Income and expense events adjust cash-flow bookkeeping only; the
/// applied payment is governed solely by the current payment and the
/// one-time events (windfalls, asset sales, one-time expenses).
pub struct EventEngine;

impl EventEngine {
    pub fn simulate_with_events(
        accounts: &[Account],
        scenario: &PaymentScenario,
        start_date: NaiveDate,
    ) -> Result<ScenarioResult> {
        scenario.validate()?;
        let (base_payment, events): (Money, &[FinancialEvent]) = match &scenario.plan {
            PaymentPlan::FixedPayment(payment) => (*payment, &[]),
            PaymentPlan::EventDriven {
                base_payment,
                events,
            } => (*base_payment, events.as_slice()),
            PaymentPlan::TargetMonths(_) => {
                return Err(PayoffError::InvalidConfiguration {
                    message: "target-month scenarios must be solved into a payment first"
                        .to_string(),
                });
            }
        };

        let mut ledger = AccountLedger::new(accounts)?;

        // avalanche queue for surplus allocation, recomputed among unpaid
        // accounts every month
        let mut current_payment = base_payment;
        let mut net_cash_flow = Money::ZERO;
        let mut recurring: Vec<RecurringFlow> = Vec::new();

        let mut schedule = Vec::new();
        let mut monthly_net_cash_flow = Vec::new();
        let mut cumulative_interest = Money::ZERO;
        let mut month = 0;

        while !ledger.all_paid_off() && month < DEFAULT_MONTH_CAP {
            month += 1;

            let mut one_time_boost = Money::ZERO;
            let mut one_time_cost = Money::ZERO;

            for event in events.iter().filter(|e| e.start_month == month) {
                match event.kind {
                    EventKind::PaymentChange => current_payment = event.amount,
                    EventKind::IncomeStart => {
                        net_cash_flow += event.amount;
                        recurring.push(RecurringFlow {
                            amount: event.amount,
                            end_month: event.end_month,
                        });
                    }
                    EventKind::ExpenseStart => {
                        net_cash_flow -= event.amount;
                        recurring.push(RecurringFlow {
                            amount: Money::ZERO - event.amount,
                            end_month: event.end_month,
                        });
                    }
                    EventKind::IncomeEnd => {
                        close_flow(&mut recurring, &mut net_cash_flow, event.amount);
                    }
                    EventKind::ExpenseEnd => {
                        close_flow(
                            &mut recurring,
                            &mut net_cash_flow,
                            Money::ZERO - event.amount,
                        );
                    }
                    EventKind::Windfall | EventKind::AssetSale => one_time_boost += event.amount,
                    EventKind::OneTimeExpense => one_time_cost += event.amount,
                }
            }

            for sale in scenario.asset_sales.iter().filter(|s| s.month == month) {
                one_time_boost += sale.amount;
            }

            // scheduled ends reverse their adjustment before this month counts
            recurring.retain(|flow| {
                if flow.end_month == Some(month) {
                    net_cash_flow -= flow.amount;
                    false
                } else {
                    true
                }
            });

            let month_payment =
                (current_payment + one_time_boost - one_time_cost).max(Money::ZERO);

            let starting_balance = ledger.total_balance();
            let mut interest_total = Money::ZERO;
            let mut purchases_total = Money::ZERO;
            for index in 0..ledger.len() {
                interest_total += ledger.accrue_interest(index);
                if !scenario.freeze_spending {
                    purchases_total += ledger.add_purchases(index);
                }
            }

            let applied_total = apply_by_apr(&mut ledger, month_payment, month);

            cumulative_interest += interest_total;
            monthly_net_cash_flow.push(net_cash_flow);
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

        Ok(ScenarioResult {
            scenario: scenario.clone(),
            outcome,
            total_months: month,
            total_interest: cumulative_interest,
            effective_payment: current_payment,
            payoff_date: outcome
                .is_converged()
                .then(|| add_months(start_date, month)),
            account_payoffs: ledger.account_payoffs(),
            schedule,
            monthly_net_cash_flow,
        })
    }
}

/// close the first open recurring entry matching the signed amount and
/// reverse its adjustment; the entry's scheduled end month is discarded with
/// it, so no entry ever reverses twice. Unmatched end events are no-ops.
fn close_flow(recurring: &mut Vec<RecurringFlow>, net_cash_flow: &mut Money, amount: Money) {
    if let Some(pos) = recurring.iter().position(|flow| flow.amount == amount) {
        *net_cash_flow -= amount;
        recurring.remove(pos);
    }
}

/// minimums first across unpaid accounts, then the remainder to the
/// highest-APR account, cascading down the queue as balances settle
fn apply_by_apr(ledger: &mut AccountLedger, month_payment: Money, month: u32) -> Money {
    let mut order = ledger.active_indices();
    order.sort_by(|&a, &b| ledger.apr(b).cmp(&ledger.apr(a)));

    let mut available = month_payment;
    let mut applied_total = Money::ZERO;

    for &index in &order {
        if !available.is_positive() {
            break;
        }
        let minimum = ledger.minimum_payment(index).min(available);
        let applied = ledger.apply_payment(index, minimum, month);
        available -= applied;
        applied_total += applied;
    }

    for &index in &order {
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
