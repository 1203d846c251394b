//! Common test utilities and mock implementations

pub mod mock_interface;

pub use mock_interface::{MockError, MockInterface, Operation};
pub use test_utils::{
    MemorySink, MockDelay, assert_float_eq, create_configured_driver, create_mock_driver,
};
