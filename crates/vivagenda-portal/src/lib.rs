pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

mod parse;
mod retry;
mod token;

pub use client::{PortalClient, PortalSession};
pub use error::PortalError;
pub use normalize::normalize;
pub use types::{RawPayload, ScheduleQuery};
