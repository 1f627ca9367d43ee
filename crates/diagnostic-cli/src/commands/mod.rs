pub mod benchmark;
pub mod diagnose;
