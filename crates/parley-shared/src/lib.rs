//! Types shared between the Parley client and the inference gateway.

pub mod constants;
pub mod protocol;
pub mod types;
