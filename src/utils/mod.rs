//! Utilities shared by the loaders and the query layer

pub mod logging;

pub use logging::{
    init_logging, log_load_summary, log_operation_complete, log_operation_start, log_warning,
};
