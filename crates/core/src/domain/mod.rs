pub mod rate;
pub mod session;
