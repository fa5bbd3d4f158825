pub mod achievement;
pub mod condition;
pub mod draw;
pub mod engine;
pub mod error;
pub mod event;
pub mod judge;
pub mod lint;
pub mod property;
pub mod session;
pub mod store;
pub mod talent;
