pub mod account;
pub mod dates;
pub mod decimal;
pub mod errors;
pub mod event_engine;
pub mod projection;
pub mod scenario;
pub mod simulator;
pub mod solver;
pub mod types;

// re-export key types
pub use account::{Account, AccountLedger};
pub use decimal::{Money, Rate};
pub use errors::{PayoffError, Result};
pub use event_engine::{EventEngine, ScenarioResult, ScenarioView};
pub use projection::{payment_for_term, term_for_payment, AmortizationProjection};
pub use scenario::{
    EventKind, FinancialEvent, PaymentPlan, PaymentScenario, PlannedAssetSale,
};
pub use simulator::{
    compare_strategies, SimulationResult, StrategyComparison, StrategySimulator,
};
pub use solver::{PaymentSolver, SolvedPayment};
pub use types::{
    AccountId, AccountPayoff, AccountStatus, MonthlyBreakdown, SimulationOutcome,
    Strategy, DEFAULT_MONTH_CAP, MAX_MONTH_CAP,
};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
