//! Message sources that feed the sync coordinator.

pub mod sms_export;

pub use sms_export::JsonExportSource;
