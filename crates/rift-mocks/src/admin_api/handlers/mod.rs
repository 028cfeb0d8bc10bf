pub mod mocks;
pub mod system;
