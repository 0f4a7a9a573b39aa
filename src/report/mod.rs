//! Reports aggregate transactions over a date range into totals, charts and tables.

mod aggregation;
pub(crate) mod charts;
mod db;
mod page;

pub use aggregation::{
    CategoryTotal, MonthBucket, ReportTransaction, Summary, WalletTotal, group_by_category,
    group_by_wallet, monthly_trend, summarize,
};
pub use db::get_report_transactions;
pub use page::get_reports_page;
