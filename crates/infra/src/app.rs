//! Application wiring: stores, cache, services and login.

use std::sync::Arc;

use tracing::info;

use storehub_auth::{authenticate, PasswordEncoder, Permission, Role, SecurityContext, User};
use storehub_products::Product;

use crate::cache::CacheAside;
use crate::config::AppConfig;
use crate::credentials::StoreCredentialStore;
use crate::error::ServiceResult;
use crate::seed::{SeedReport, SetupLoader};
use crate::services::{PermissionService, ProductService, RoleService, UserService};
use crate::store::{InMemoryEntityStore, SharedStore};

/// One store per entity type.
#[derive(Clone)]
pub struct Stores {
    pub products: SharedStore<Product>,
    pub users: SharedStore<User>,
    pub roles: SharedStore<Role>,
    pub permissions: SharedStore<Permission>,
}

impl Stores {
    /// In-memory stores with the unique keys each entity declares.
    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(
                InMemoryEntityStore::new().with_unique("name", |p: &Product| p.name.clone()),
            ),
            users: Arc::new(
                InMemoryEntityStore::new()
                    .with_unique("email", |u: &User| u.email.clone())
                    .with_unique("username", |u: &User| u.username.clone()),
            ),
            roles: Arc::new(
                InMemoryEntityStore::new().with_unique("name", |r: &Role| r.name.to_string()),
            ),
            permissions: Arc::new(
                InMemoryEntityStore::new().with_unique("name", |p: &Permission| p.name.clone()),
            ),
        }
    }
}

pub struct Application {
    config: AppConfig,
    stores: Stores,
    cache: Arc<CacheAside>,
    encoder: Arc<dyn PasswordEncoder>,
    credentials: StoreCredentialStore,
    seed: SeedReport,
    pub products: ProductService,
    pub users: UserService,
    pub roles: RoleService,
    pub permissions: PermissionService,
}

impl Application {
    /// Wire services over `stores` and run the seed loader.
    pub fn new(
        config: AppConfig,
        encoder: Arc<dyn PasswordEncoder>,
        stores: Stores,
    ) -> ServiceResult<Self> {
        let cache = Arc::new(CacheAside::from_config(
            config.cache_enabled,
            config.cache_capacity,
            config.cache_ttl,
        ));

        let seed = SetupLoader::new(
            stores.permissions.clone(),
            stores.roles.clone(),
            stores.users.clone(),
            encoder.clone(),
            config.admin.clone(),
        )
        .run()?;

        let app = Self {
            products: ProductService::new(stores.products.clone(), cache.clone()),
            users: UserService::new(
                stores.users.clone(),
                stores.roles.clone(),
                encoder.clone(),
                cache.clone(),
            ),
            roles: RoleService::new(
                stores.roles.clone(),
                stores.permissions.clone(),
                stores.users.clone(),
                cache.clone(),
            ),
            permissions: PermissionService::new(
                stores.permissions.clone(),
                stores.roles.clone(),
                stores.users.clone(),
                cache.clone(),
            ),
            credentials: StoreCredentialStore::new(stores.users.clone()),
            config,
            stores,
            cache,
            encoder,
            seed,
        };
        info!(cache_enabled = app.cache.is_enabled(), "application ready");
        Ok(app)
    }

    pub fn in_memory(config: AppConfig, encoder: Arc<dyn PasswordEncoder>) -> ServiceResult<Self> {
        Self::new(config, encoder, Stores::in_memory())
    }

    /// Authenticate and open a security context. Authorities are resolved
    /// once here and do not follow later role changes.
    pub fn login(&self, identifier: &str, password: &str) -> ServiceResult<SecurityContext> {
        Ok(authenticate(
            &self.credentials,
            self.encoder.as_ref(),
            identifier,
            password,
        )?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheAside {
        &self.cache
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn seed_report(&self) -> SeedReport {
        self.seed
    }
}
