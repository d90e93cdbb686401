pub mod retention;
pub mod snapshot_sync;
