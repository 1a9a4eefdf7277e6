mod init_logging;
mod load_dotenv;
mod slug;
mod time;

pub use init_logging::init_logging;
pub use load_dotenv::load_dotenv;
pub use slug::slug;
pub use time::{midnight, midnight_of, now_iso, to_iso};

pub fn rand_hex(bytes: usize) -> String {
    let rand: Vec<u8> = (0..bytes).map(|_| rand::random::<u8>()).collect();
    hex::encode(rand)
}
