//! datasweep - Convert tabular data between CSV and Excel
//!
//! Loads CSV or xlsx uploads into an in-memory table, optionally removes
//! duplicate rows, fills missing numeric cells with the column mean, keeps a
//! subset of columns, samples two numeric columns for a bar chart, and
//! exports the result as CSV or xlsx.

pub mod chart;
pub mod clean;
pub mod config;
pub mod encode;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;
pub mod session;

pub use config::{Config, ExportFormat, Operations};
pub use error::{Result, SweepError};
pub use model::Table;
pub use session::{BatchReport, Session, UploadedFile};
