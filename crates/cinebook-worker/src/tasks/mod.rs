//! Built-in scheduled tasks.

pub mod refund_report;
pub mod refund_sweep;

pub use refund_report::ExhaustedRefundReportTask;
pub use refund_sweep::RefundSweepTask;
