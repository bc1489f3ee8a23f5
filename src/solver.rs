use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::dates::months_between;
use crate::decimal::Money;
use crate::errors::{PayoffError, Result};
use crate::projection::payment_for_term;
use crate::simulator::StrategySimulator;
use crate::types::Strategy;

/// iteration cap on the payment search
const MAX_ITERATIONS: u32 = 50;

/// bracket width below which the search is considered exact
const TOLERANCE: Money = Money::EPSILON;

/// solved monthly payment with its convergence evidence
///
/// `converged` means the bracket closed below one cent; `feasible` means the
/// upper search bound reached the target at all. Callers should treat a
/// non-converged or infeasible result as an estimate, not a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedPayment {
    pub payment: Money,
    pub target_months: u32,
    pub strategy: Strategy,
    pub converged: bool,
    pub feasible: bool,
    /// high minus low at termination
    pub bracket_width: Money,
    pub iterations: u32,
}

/// binary-search solver for the minimum payment hitting a payoff horizon
///
/// Uses the strategy simulator as its oracle; single-account inputs without
/// recurring purchases take the closed-form annuity path instead.
pub struct PaymentSolver;

impl PaymentSolver {
    /// minimum monthly payment reaching zero balance within `target_months`
    pub fn solve_for_months(
        accounts: &[Account],
        target_months: u32,
        strategy: Strategy,
    ) -> Result<SolvedPayment> {
        if target_months == 0 {
            return Err(PayoffError::InvalidTargetMonths {
                months: target_months,
            });
        }
        if accounts.is_empty() {
            return Err(PayoffError::EmptyAccountSet);
        }
        for account in accounts {
            account.validate()?;
        }

        let minimums: Money = accounts.iter().map(|a| a.minimum_payment).sum();
        let balances: Money = accounts.iter().map(|a| a.balance).sum();

        if balances <= Money::EPSILON {
            return Ok(SolvedPayment {
                payment: Money::ZERO,
                target_months,
                strategy,
                converged: true,
                feasible: true,
                bracket_width: Money::ZERO,
                iterations: 0,
            });
        }

        // PMT closed form is exact for one account without recurring spend
        if accounts.len() == 1 && accounts[0].monthly_purchases.is_zero() {
            let exact = payment_for_term(accounts[0].balance, accounts[0].apr, target_months);
            return Ok(SolvedPayment {
                payment: exact.max(minimums),
                target_months,
                strategy,
                converged: true,
                feasible: true,
                bracket_width: Money::ZERO,
                iterations: 0,
            });
        }

        let mut low = minimums;
        let mut high = (balances * dec!(2)).max(low);
        let mut iterations = 0;

        let reaches_target = |payment: Money| -> Result<bool> {
            let result =
                StrategySimulator::simulate(accounts, payment, strategy, NaiveDate::default())?;
            Ok(result.outcome.is_converged() && result.total_months <= target_months)
        };

        // the floor payment already makes it: nothing to search
        if reaches_target(low)? {
            return Ok(SolvedPayment {
                payment: low,
                target_months,
                strategy,
                converged: true,
                feasible: true,
                bracket_width: Money::ZERO,
                iterations: 0,
            });
        }

        // even twice the debt per month fails: report the bound, flagged
        if !reaches_target(high)? {
            return Ok(SolvedPayment {
                payment: high,
                target_months,
                strategy,
                converged: false,
                feasible: false,
                bracket_width: high - low,
                iterations: 0,
            });
        }

        while iterations < MAX_ITERATIONS && (high - low) > TOLERANCE {
            iterations += 1;
            let mid = (low + high) / dec!(2);
            if reaches_target(mid)? {
                high = mid;
            } else {
                low = mid;
            }
        }

        // high is the tightest known-sufficient payment, already cent-rounded,
        // so the produced plan pays off at or before the target
        Ok(SolvedPayment {
            payment: high,
            target_months,
            strategy,
            converged: (high - low) <= TOLERANCE,
            feasible: true,
            bracket_width: high - low,
            iterations,
        })
    }

    /// same search against a calendar date, converted via whole-month difference
    pub fn solve_for_date(
        accounts: &[Account],
        target_date: NaiveDate,
        start_date: NaiveDate,
        strategy: Strategy,
    ) -> Result<SolvedPayment> {
        let months = months_between(start_date, target_date);
        if months == 0 {
            return Err(PayoffError::InvalidDate {
                message: format!("target date {target_date} is not after start {start_date}"),
            });
        }
        Self::solve_for_months(accounts, months, strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use proptest::prelude::{prop_assert, proptest};

    fn card(name: &str, balance: i64, apr: u32, minimum: i64) -> Account {
        Account::new(
            name,
            Money::from_major(balance),
            Rate::from_percentage(apr),
            Money::from_major(minimum),
        )
    }

    fn two_card_set() -> Vec<Account> {
        vec![
            card("card-a", 1_000, 25, 30),
            card("card-b", 3_000, 15, 60),
        ]
    }

    #[test]
    fn test_closed_form_single_account() {
        let accounts = vec![card("visa", 5_000, 20, 100)];
        let solved =
            PaymentSolver::solve_for_months(&accounts, 11, Strategy::Avalanche).unwrap();

        assert_eq!(solved.payment, Money::from_str_exact("501.26").unwrap());
        assert!(solved.converged);
        assert!(solved.feasible);
        assert_eq!(solved.iterations, 0);
    }

    #[test]
    fn test_solved_payment_feeds_back_within_target() {
        let accounts = two_card_set();
        let target = 12;
        let solved =
            PaymentSolver::solve_for_months(&accounts, target, Strategy::Avalanche).unwrap();
        assert!(solved.feasible);

        let result = StrategySimulator::simulate(
            &accounts,
            solved.payment,
            Strategy::Avalanche,
            NaiveDate::default(),
        )
        .unwrap();
        assert!(result.outcome.is_converged());
        assert!(result.total_months <= target);
    }

    #[test]
    fn test_tighter_target_needs_more() {
        let accounts = two_card_set();
        let relaxed =
            PaymentSolver::solve_for_months(&accounts, 12, Strategy::Avalanche).unwrap();
        let tight =
            PaymentSolver::solve_for_months(&accounts, 11, Strategy::Avalanche).unwrap();

        assert!(tight.payment >= relaxed.payment);
    }

    #[test]
    fn test_minimums_floor_when_they_suffice() {
        // both minimums outpace interest, so the floor converges on its own
        let accounts = two_card_set();
        let solved =
            PaymentSolver::solve_for_months(&accounts, 600, Strategy::Snowball).unwrap();

        assert_eq!(solved.payment, Money::from_major(90));
        assert!(solved.converged);
        assert_eq!(solved.iterations, 0);
    }

    #[test]
    fn test_infeasible_when_purchases_outrun_any_payment() {
        let accounts = vec![
            card("spender", 1_000, 20, 25).with_purchases(Money::from_major(5_000)),
        ];
        let solved =
            PaymentSolver::solve_for_months(&accounts, 12, Strategy::Avalanche).unwrap();

        assert!(!solved.feasible);
        assert!(!solved.converged);
        // best estimate is the upper bound probed
        assert_eq!(solved.payment, Money::from_major(2_000));
    }

    #[test]
    fn test_zero_balances_solve_to_zero() {
        let accounts = vec![card("settled", 0, 20, 25)];
        let solved =
            PaymentSolver::solve_for_months(&accounts, 6, Strategy::Snowball).unwrap();
        assert_eq!(solved.payment, Money::ZERO);
        assert!(solved.converged);
    }

    #[test]
    fn test_zero_target_rejected() {
        assert!(matches!(
            PaymentSolver::solve_for_months(&two_card_set(), 0, Strategy::Snowball),
            Err(PayoffError::InvalidTargetMonths { months: 0 })
        ));
    }

    #[test]
    fn test_solve_for_date() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let target = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();

        let by_date =
            PaymentSolver::solve_for_date(&two_card_set(), target, start, Strategy::Avalanche)
                .unwrap();
        let by_months =
            PaymentSolver::solve_for_months(&two_card_set(), 12, Strategy::Avalanche).unwrap();
        assert_eq!(by_date.payment, by_months.payment);

        // target on or before start is rejected
        assert!(PaymentSolver::solve_for_date(
            &two_card_set(),
            start,
            start,
            Strategy::Avalanche
        )
        .is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(16))]
        #[test]
        fn prop_solver_feedback_holds(
            balance_a in 500i64..6_000,
            balance_b in 500i64..6_000,
            apr_a in 0u32..30,
            apr_b in 0u32..30,
            target in 6u32..36,
        ) {
            let accounts = vec![
                card("a", balance_a, apr_a, balance_a / 40 + 1),
                card("b", balance_b, apr_b, balance_b / 40 + 1),
            ];
            let solved =
                PaymentSolver::solve_for_months(&accounts, target, Strategy::Avalanche).unwrap();
            prop_assert!(solved.feasible);

            let result = StrategySimulator::simulate(
                &accounts,
                solved.payment,
                Strategy::Avalanche,
                NaiveDate::default(),
            )
            .unwrap();
            prop_assert!(result.outcome.is_converged());
            prop_assert!(result.total_months <= target);

            if target > 1 {
                let tighter = PaymentSolver::solve_for_months(
                    &accounts,
                    target - 1,
                    Strategy::Avalanche,
                )
                .unwrap();
                prop_assert!(tighter.payment >= solved.payment);
            }
        }
    }
}
