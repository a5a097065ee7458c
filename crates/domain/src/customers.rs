//! Customer registry service.

use std::sync::Arc;

use common::CustomerId;
use store::{Customer, CustomerStore, NewCustomer, StoreError};

use crate::{Clock, DomainError, SystemClock, validate};

/// Service for managing the customer registry.
pub struct CustomerService<S: CustomerStore> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: CustomerStore> CustomerService<S> {
    /// Creates a service using the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a service with an injected clock.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Registers a customer.
    #[tracing::instrument(skip(self))]
    pub async fn create_customer(&self, new: NewCustomer) -> Result<Customer, DomainError> {
        validate::customer(&new, self.clock.today())?;
        self.store.insert_customer(new).await.map_err(map_write_err)
    }

    /// Fetches a customer by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, DomainError> {
        self.store
            .customer(id)
            .await
            .map_err(DomainError::Store)?
            .ok_or(DomainError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            })
    }

    /// Replaces every field of an existing customer.
    #[tracing::instrument(skip(self))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        new: NewCustomer,
    ) -> Result<Customer, DomainError> {
        validate::customer(&new, self.clock.today())?;
        self.store
            .update_customer(id, new)
            .await
            .map_err(map_write_err)
    }

    /// Lists customers, optionally narrowed to a CPF prefix.
    #[tracing::instrument(skip(self))]
    pub async fn list_customers(
        &self,
        cpf_prefix: Option<&str>,
    ) -> Result<Vec<Customer>, DomainError> {
        self.store
            .list_customers(cpf_prefix)
            .await
            .map_err(DomainError::Store)
    }
}

fn map_write_err(e: StoreError) -> DomainError {
    match e {
        StoreError::Duplicate {
            entity,
            field,
            value,
        } => DomainError::Conflict {
            entity,
            field,
            value,
        },
        StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
        other => DomainError::Store(other),
    }
}
