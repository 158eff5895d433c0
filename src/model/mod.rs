//! Types that represent the core data model, such as `Transaction` and `DashboardData`.
mod amount;
mod dashboard;
pub(crate) mod mapping;
mod transaction;

pub use amount::{Amount, AmountError, AmountFormat};
pub use dashboard::{CategorySummary, DashboardData, MonthlyStat, UserCategory};
pub use transaction::{NewTransaction, Transaction, TransactionType, TransactionUpdates};
pub(crate) use transaction::parse_date;
