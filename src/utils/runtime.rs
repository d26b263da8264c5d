use anyhow::Result;

/// Everything runs on one thread: a single tick loop and synchronous mutations in between.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
