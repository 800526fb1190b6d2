use anyhow::Result;

/// Everything the front end does runs on one thread; the store relies on that rather than on
/// cross-thread locking of its consumers.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
