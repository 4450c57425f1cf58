//! Compiled-in reference data the agents ground their answers in: the account directory,
//! historical feature requests and a snapshot of the product codebase.

pub mod codebase;
pub mod customers;
pub mod requests;

pub use codebase::{ArchitecturePattern, Component, PastImplementation};
pub use customers::{customer_mentioned_in, CustomerRecord, CUSTOMERS};
pub use requests::{similar_requests, HistoricalRequest, REQUESTS};
