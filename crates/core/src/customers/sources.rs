use chrono::{DateTime, Local};

use crate::domain::customer::CustomerId;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub trait CustomerIdSource: Send + Sync {
    fn next_id(&self) -> CustomerId;
}

/// Wall clock of the running process, in its local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Random v4 identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomCustomerIdSource;

impl CustomerIdSource for RandomCustomerIdSource {
    fn next_id(&self) -> CustomerId {
        CustomerId::random()
    }
}
