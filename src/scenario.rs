use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{PayoffError, Result};

/// discrete financial event on a scenario timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// overwrite the monthly payment from this month onward
    PaymentChange,
    /// recurring income begins; adjusts available cash until ended
    IncomeStart,
    /// recurring income ends
    IncomeEnd,
    /// recurring expense begins; adjusts available cash until ended
    ExpenseStart,
    /// recurring expense ends
    ExpenseEnd,
    /// one-time proceeds applied to this month's payment
    AssetSale,
    /// one-time lump sum applied to this month's payment
    Windfall,
    /// one-time cost subtracted from this month's payment, floored at zero
    OneTimeExpense,
}

/// one event on a scenario timeline
///
/// `start_month` is 1-based, relative to simulation start. `end_month` is
/// only meaningful for `IncomeStart`/`ExpenseStart`; an open-ended entry
/// stays in effect until the simulation ends or a matching `*End` fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub start_month: u32,
    pub end_month: Option<u32>,
    pub amount: Money,
    pub description: String,
}

impl FinancialEvent {
    pub fn new(kind: EventKind, start_month: u32, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            start_month,
            end_month: None,
            amount,
            description: String::new(),
        }
    }

    pub fn ending(mut self, end_month: u32) -> Self {
        self.end_month = Some(end_month);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.start_month == 0 {
            return Err(PayoffError::InvalidEvent {
                message: "event start month must be 1-based".to_string(),
            });
        }
        if self.amount.is_negative() {
            return Err(PayoffError::InvalidEvent {
                message: format!("negative event amount {}", self.amount),
            });
        }
        match self.kind {
            EventKind::IncomeStart | EventKind::ExpenseStart => {
                if let Some(end) = self.end_month {
                    if end < self.start_month {
                        return Err(PayoffError::InvalidEvent {
                            message: format!(
                                "end month {end} precedes start month {}",
                                self.start_month
                            ),
                        });
                    }
                }
            }
            _ => {
                if self.end_month.is_some() {
                    return Err(PayoffError::InvalidEvent {
                        message: "end month only applies to recurring start events".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// planned one-time asset sale, applied like an asset-sale event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAssetSale {
    pub month: u32,
    pub amount: Money,
    pub description: String,
}

/// how a scenario funds its payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentPlan {
    /// same payment every month
    FixedPayment(Money),
    /// solve for the payment reaching zero balance within this many months
    TargetMonths(u32),
    /// base payment mutated by a sorted event timeline
    EventDriven {
        base_payment: Money,
        events: Vec<FinancialEvent>,
    },
}

/// named payoff configuration; immutable input to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentScenario {
    pub name: String,
    pub plan: PaymentPlan,
    pub asset_sales: Vec<PlannedAssetSale>,
    /// suppress monthly purchase accrual for the whole run
    pub freeze_spending: bool,
}

impl PaymentScenario {
    pub fn fixed(name: impl Into<String>, payment: Money) -> Self {
        Self {
            name: name.into(),
            plan: PaymentPlan::FixedPayment(payment),
            asset_sales: Vec::new(),
            freeze_spending: false,
        }
    }

    pub fn target_months(name: impl Into<String>, months: u32) -> Self {
        Self {
            name: name.into(),
            plan: PaymentPlan::TargetMonths(months),
            asset_sales: Vec::new(),
            freeze_spending: false,
        }
    }

    pub fn event_driven(
        name: impl Into<String>,
        base_payment: Money,
        events: Vec<FinancialEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            plan: PaymentPlan::EventDriven {
                base_payment,
                events,
            },
            asset_sales: Vec::new(),
            freeze_spending: false,
        }
    }

    pub fn with_asset_sales(mut self, asset_sales: Vec<PlannedAssetSale>) -> Self {
        self.asset_sales = asset_sales;
        self
    }

    pub fn with_frozen_spending(mut self) -> Self {
        self.freeze_spending = true;
        self
    }

    /// events on the plan, empty for non-event plans
    pub fn events(&self) -> &[FinancialEvent] {
        match &self.plan {
            PaymentPlan::EventDriven { events, .. } => events,
            _ => &[],
        }
    }

    /// check payment amounts, the event timeline ordering, and asset sales
    pub fn validate(&self) -> Result<()> {
        match &self.plan {
            PaymentPlan::FixedPayment(payment) => {
                if !payment.is_positive() {
                    return Err(PayoffError::InvalidPaymentAmount { amount: *payment });
                }
            }
            PaymentPlan::TargetMonths(months) => {
                if *months == 0 {
                    return Err(PayoffError::InvalidTargetMonths { months: *months });
                }
            }
            PaymentPlan::EventDriven {
                base_payment,
                events,
            } => {
                if base_payment.is_negative() {
                    return Err(PayoffError::InvalidPaymentAmount {
                        amount: *base_payment,
                    });
                }
                let mut previous = 0;
                for event in events {
                    event.validate()?;
                    if event.start_month < previous {
                        return Err(PayoffError::UnsortedEvents {
                            previous,
                            found: event.start_month,
                        });
                    }
                    previous = event.start_month;
                }
            }
        }
        for sale in &self.asset_sales {
            if sale.month == 0 {
                return Err(PayoffError::InvalidEvent {
                    message: "asset sale month must be 1-based".to_string(),
                });
            }
            if sale.amount.is_negative() {
                return Err(PayoffError::InvalidEvent {
                    message: format!("negative asset sale amount {}", sale.amount),
                });
            }
        }
        Ok(())
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// parse from a json string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
