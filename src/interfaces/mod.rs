pub mod diagnostics;
pub mod http;
pub mod mqtt;
