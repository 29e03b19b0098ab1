//! Infrastructure layer: storage, caching, configuration and the
//! application services that tie authorization, querying and persistence
//! together.

pub mod app;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod paging;
pub mod seed;
pub mod services;
pub mod store;

pub use app::{Application, Stores};
pub use cache::CacheAside;
pub use config::{AdminSeed, AppConfig, ConfigError};
pub use credentials::StoreCredentialStore;
pub use error::{ServiceError, ServiceResult};
pub use seed::{SeedReport, SetupLoader};
pub use services::{
    PermissionOp, PermissionService, ProductOp, ProductService, RoleOp, RoleService, UserOp,
    UserService,
};
pub use store::{EntityStore, InMemoryEntityStore, SharedStore, StoreError, StoreResult};
