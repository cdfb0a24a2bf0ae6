pub mod clients;
pub mod flags;
pub mod memory;
pub mod sessions;
