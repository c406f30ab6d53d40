pub mod executor;
pub mod tape;
pub mod register;
pub mod duplex;
pub mod dialect;
pub mod batch;
