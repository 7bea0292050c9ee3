//! Daily and monthly reports over the transaction ledger.

mod aggregation;
mod report_page;

pub use aggregation::{NetProfitInputs, net_profit};
pub use report_page::{get_report_page, post_report};
