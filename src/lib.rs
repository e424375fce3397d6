pub mod auth;
pub mod batch;
pub mod clock;
pub mod domain;
pub mod engine;
pub mod notify;
pub mod output;
pub mod parsing;
pub mod reporting;
pub mod store;
