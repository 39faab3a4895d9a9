pub mod backoff;

pub use backoff::{is_retryable_status, retry, Backoff};
