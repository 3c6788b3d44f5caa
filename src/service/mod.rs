pub mod export;
pub mod field;
pub mod report;
pub mod table;

pub use export::ExportField;
pub use field::{AddFieldRequest, FieldService};
pub use report::{ReportColumnRef, ReportRequest, ReportService, REPORT_DATE_COLUMN};
pub use table::{CreateTableRequest, DeleteOutcome, TableService};
