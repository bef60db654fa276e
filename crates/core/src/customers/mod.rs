pub mod sources;

use crate::domain::customer::{
    CreateCustomerRequest, CreateCustomerResponse, DEFAULT_CUSTOMER_EMAIL, DEFAULT_CUSTOMER_NAME,
};

pub use self::sources::{Clock, CustomerIdSource, RandomCustomerIdSource, SystemClock};

pub trait CreateCustomerHandler: Send + Sync {
    fn handle(&self, request: &CreateCustomerRequest) -> CreateCustomerResponse;
}

pub struct DefaultCreateCustomerHandler<C, I> {
    clock: C,
    ids: I,
}

impl<C, I> DefaultCreateCustomerHandler<C, I> {
    pub fn new(clock: C, ids: I) -> Self {
        Self { clock, ids }
    }
}

impl Default for DefaultCreateCustomerHandler<SystemClock, RandomCustomerIdSource> {
    fn default() -> Self {
        Self::new(SystemClock, RandomCustomerIdSource)
    }
}

impl<C, I> CreateCustomerHandler for DefaultCreateCustomerHandler<C, I>
where
    C: Clock,
    I: CustomerIdSource,
{
    fn handle(&self, _request: &CreateCustomerRequest) -> CreateCustomerResponse {
        CreateCustomerResponse {
            id: self.ids.next_id(),
            name: DEFAULT_CUSTOMER_NAME.to_string(),
            email: DEFAULT_CUSTOMER_EMAIL.to_string(),
            date: self.clock.now(),
        }
    }
}
