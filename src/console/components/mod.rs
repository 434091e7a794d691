//! Reusable UI components for the console
//!
//! The data table and the record dialog are generic over the entity they
//! show; screens compose them and own all backend traffic.

pub mod confirm_delete;
pub mod data_table;
pub mod form_field;
pub mod notification;
pub mod pagination;
pub mod record_dialog;
pub mod row_actions;
pub mod skeleton;

pub use data_table::{DataTable, TableEvent};
pub use form_field::{Form, FormField};
pub use notification::{Notice, NoticeCenter, NoticeKind};
pub use record_dialog::{DialogEvent, DialogMode, RecordDialog};
pub use row_actions::{RowAction, RowActions};
