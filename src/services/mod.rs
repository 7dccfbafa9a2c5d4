pub mod config;
pub mod log_route;
pub mod resume;

pub use config::ConfigService;
pub use log_route::{log_type_label, LogDelivery, LogService, LogSink, COMMAND_ERROR_LOG, CONFIG_CHANGE_LOG, LOG_TYPES};
pub use resume::ResumeService;
