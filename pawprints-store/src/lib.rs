pub mod app_config;
pub mod quote_board;

pub use app_config::Config;
pub use quote_board::QuoteBoard;
