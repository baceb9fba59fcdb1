pub mod error;
pub mod provider;
pub mod worker;

#[cfg(test)]
pub(crate) mod scripted;
