use std::fmt;

use chrono::{DateTime, Local};
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CUSTOMER_NAME: &str = "Diego Lins";
pub const DEFAULT_CUSTOMER_EMAIL: &str = "diegolins@ibm.com";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Inbound command for the create-customer operation.
///
/// Only a JSON object is accepted. The fields are read but the handler does
/// not use them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl<'de> Deserialize<'de> for CreateCustomerRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CreateCustomerRequestVisitor)
    }
}

struct CreateCustomerRequestVisitor;

impl<'de> Visitor<'de> for CreateCustomerRequestVisitor {
    type Value = CreateCustomerRequest;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a create customer object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut request = CreateCustomerRequest::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "name" => request.name = map.next_value()?,
                "email" => request.email = map.next_value()?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(request)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomerResponse {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub date: DateTime<Local>,
}
