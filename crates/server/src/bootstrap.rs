use std::sync::Arc;

use axum::Router;
use shop_core::config::{AppConfig, ConfigError, LoadOptions};
use shop_core::{CreateCustomerHandler, DefaultCreateCustomerHandler};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::customers;

pub struct Application {
    pub config: AppConfig,
    pub create_customer: Arc<dyn CreateCustomerHandler>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not bind `{address}`: {source}")]
    Bind { address: String, source: std::io::Error },
}

pub fn load_config(options: LoadOptions) -> Result<AppConfig, BootstrapError> {
    Ok(AppConfig::load(options)?)
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    Application { config, create_customer: Arc::new(DefaultCreateCustomerHandler::default()) }
}

impl Application {
    pub fn router(&self) -> Router {
        customers::router(self.create_customer.clone())
    }

    pub async fn bind_api(&self) -> Result<TcpListener, BootstrapError> {
        let address = self.config.api_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| BootstrapError::Bind { address: address.clone(), source })?;
        info!(
            event_name = "system.bootstrap.api_bound",
            correlation_id = "bootstrap",
            bind_address = %address,
            "customer api listener bound"
        );
        Ok(listener)
    }
}
