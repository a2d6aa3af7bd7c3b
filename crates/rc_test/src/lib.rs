pub mod mock;
pub mod stream;
