//! Output blocks

pub mod table_logger;

pub use table_logger::TableLogger;
