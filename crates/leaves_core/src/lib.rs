pub mod badge;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod remote;
pub mod session;
pub mod storage;
pub mod store;
pub mod view;
