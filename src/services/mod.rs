pub mod read_service;

pub use read_service::{read_once, run, RegisterReading};
