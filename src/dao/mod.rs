/// Database model definitions.
pub mod models;
/// Progress, user and speech-attempt repositories.
pub mod progress_store;
/// Storage abstraction layer for repository operations.
pub mod storage;
