use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum PayoffError {
    #[error("invalid account {name}: {message}")]
    InvalidAccount { name: String, message: String },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount { amount: Money },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate { rate: Rate },

    #[error("no accounts supplied")]
    EmptyAccountSet,

    #[error("invalid target months: {months}")]
    InvalidTargetMonths { months: u32 },

    #[error("invalid date: {message}")]
    InvalidDate { message: String },

    #[error("events out of order: event at month {found} follows month {previous}")]
    UnsortedEvents { previous: u32, found: u32 },

    #[error("invalid event: {message}")]
    InvalidEvent { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

pub type Result<T> = std::result::Result<T, PayoffError>;
