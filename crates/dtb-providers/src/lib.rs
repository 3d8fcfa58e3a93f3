//! Provider adapters: the Dler Cloud account API and the Vultr hosting API.
//!
//! Both implement the `dtb-core` usage ports on top of a shared JSON-over-HTTP helper.

pub mod account;
pub mod hosting;
pub mod http;

#[cfg(test)]
mod test_support;

pub use account::DlerCloudClient;
pub use hosting::VultrClient;
