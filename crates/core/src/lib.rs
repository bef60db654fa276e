pub mod config;
pub mod customers;
pub mod domain;
pub mod errors;

pub use customers::{
    Clock, CreateCustomerHandler, CustomerIdSource, DefaultCreateCustomerHandler,
    RandomCustomerIdSource, SystemClock,
};
pub use domain::customer::{CreateCustomerRequest, CreateCustomerResponse, CustomerId};
pub use errors::{ApplicationError, InterfaceError};
