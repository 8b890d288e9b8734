pub mod catalog;
pub mod glue;
pub mod object_store;
pub mod s3;

/// Runs an AWS SDK future to completion from synchronous adapter code.
///
/// Requires the multi-thread Tokio runtime the binaries start.
pub(crate) fn block_on_sdk<F: std::future::Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
