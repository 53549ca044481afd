pub mod executor;
pub mod feed;
pub mod notify;
pub mod prompt;
pub mod queue;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod validate;
