/// ACOMPANY - element membership service
///
/// Accounts pick one of four elements, browse that element's gallery and
/// may open one other element per day. Administrators manage accounts,
/// the rank catalog and a forbidden gallery tier.

pub mod access;
pub mod account;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod element;
pub mod error;
pub mod gallery;
pub mod metrics;
pub mod ranks;
pub mod server;
pub mod session;
pub mod store;

pub use context::AppContext;
