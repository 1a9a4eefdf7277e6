mod read_device;
mod start;

pub use read_device::{read_huawei, read_zeversolar};
pub use start::start;
