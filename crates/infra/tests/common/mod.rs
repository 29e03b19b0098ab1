#![allow(dead_code)]

use std::sync::Arc;

use storehub_auth::{PasswordEncoder, Role, RoleKind, SecurityContext, UserDraft, USER_SCHEMA};
use storehub_infra::{AppConfig, Application, EntityStore};
use storehub_products::{Category, Product, ProductDraft};
use storehub_query::Predicate;

pub const ADMIN_EMAIL: &str = "admin@storehub.local";
pub const ADMIN_PASSWORD: &str = "admin";

/// Test encoder: `enc:` prefix, reversible by eye.
pub struct PrefixEncoder;

impl PasswordEncoder for PrefixEncoder {
    fn encode(&self, raw: &str) -> String {
        format!("enc:{raw}")
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        encoded.strip_prefix("enc:") == Some(raw)
    }
}

pub fn app() -> Application {
    app_with(AppConfig::default())
}

pub fn app_with(config: AppConfig) -> Application {
    Application::in_memory(config, Arc::new(PrefixEncoder)).unwrap()
}

pub fn admin(app: &Application) -> SecurityContext {
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).unwrap()
}

pub fn role(app: &Application, kind: RoleKind) -> Role {
    app.roles
        .list(&admin(app))
        .unwrap()
        .into_iter()
        .find(|r| r.name == kind)
        .unwrap()
}

/// Create a USER-role account and log it in.
pub fn reader(app: &Application, username: &str) -> SecurityContext {
    let email = format!("{username}@example.com");
    app.users
        .create(
            &admin(app),
            UserDraft {
                username: username.into(),
                email: email.clone(),
                password: "pw".into(),
                roles: vec![role(app, RoleKind::User).id],
            },
        )
        .unwrap();
    app.login(&email, "pw").unwrap()
}

pub fn seed_products(app: &Application, rows: &[(&str, Category, f64, Option<f64>)]) -> Vec<Product> {
    let ctx = admin(app);
    rows.iter()
        .map(|(name, category, price, discount)| {
            let mut draft = ProductDraft::new(*name, *category, *price, 10);
            draft.discount = *discount;
            app.products.create(&ctx, draft).unwrap()
        })
        .collect()
}

pub fn stored_user_roles(app: &Application, username: &str) -> Vec<Role> {
    let predicate = Predicate::field_equals(&USER_SCHEMA, "username", username).unwrap();
    app.stores().users.find_one(&predicate).unwrap().unwrap().roles
}
