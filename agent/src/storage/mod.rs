//! Durable storage for the last observed snapshot.

mod state_file;

pub use state_file::StateFile;
