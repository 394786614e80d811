mod harness;

pub use harness::Harness;
