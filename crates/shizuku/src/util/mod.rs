pub mod fmt;
pub mod http;
