use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a debt account
pub type AccountId = Uuid;

/// default safety cap on simulated months
pub const DEFAULT_MONTH_CAP: u32 = 600;

/// hard ceiling on any caller-supplied month cap
pub const MAX_MONTH_CAP: u32 = 1200;

/// payoff ordering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// smallest balance first, surplus to the front of the queue
    Snowball,
    /// highest APR first, surplus to the front of the queue
    Avalanche,
    /// payment split proportionally to each account's current balance share
    Simultaneous,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Snowball,
        Strategy::Avalanche,
        Strategy::Simultaneous,
    ];
}

/// per-simulation account state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    /// carrying a balance, accrues interest and purchases
    Active,
    /// balance clamped to zero; terminal, purchases no longer accrue
    PaidOff,
}

/// simulation termination, tagged so a capped run cannot be mistaken for a payoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationOutcome {
    /// every account reached zero balance
    Converged { months: u32 },
    /// the month safety cap was hit with balance remaining
    DidNotConverge { months_simulated: u32 },
}

impl SimulationOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, SimulationOutcome::Converged { .. })
    }

    /// months simulated regardless of convergence
    pub fn months(&self) -> u32 {
        match *self {
            SimulationOutcome::Converged { months } => months,
            SimulationOutcome::DidNotConverge { months_simulated } => months_simulated,
        }
    }
}

/// one simulation tick across all tracked accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    /// 1-based month index from simulation start
    pub month: u32,
    pub starting_balance: Money,
    pub payment_applied: Money,
    pub interest_accrued: Money,
    pub principal_paid: Money,
    pub purchases_added: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

/// per-account payoff detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPayoff {
    pub account_id: AccountId,
    pub account_name: String,
    /// month the balance first reached zero, if it did
    pub payoff_month: Option<u32>,
    /// 1-based position in which the account paid off
    pub payoff_order: Option<u32>,
    pub total_interest: Money,
    pub status: AccountStatus,
}
