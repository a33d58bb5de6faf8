mod digest;
mod store;

pub use digest::value_digest;
pub use store::MemoryKeyCommands;
