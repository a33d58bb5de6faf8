pub mod keys;
pub mod topics;
