pub mod account;
pub mod state;
pub mod sync;
