pub mod achievement;
pub mod age;
pub mod config;
pub mod event;
pub mod judge;
pub mod stat;
pub mod talent;
