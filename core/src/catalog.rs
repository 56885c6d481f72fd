//! Admin API collections and the records the console works with.
//!
//! # Design
//! Every screen of the admin console talks to one of `RESOURCES` through an
//! identical `Resource`. Entities that the aggregation helpers read have
//! typed models here; everything else is handled as a loose JSON `Record`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::resource::{Resource, ResourceConfig, UpdateMethod};

/// An entity with no dedicated model.
pub type Record = Map<String, Value>;

/// One backend collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDef {
    pub name: &'static str,
    pub base_path: &'static str,
    pub update_method: UpdateMethod,
}

impl ResourceDef {
    const fn patch(name: &'static str, base_path: &'static str) -> Self {
        Self {
            name,
            base_path,
            update_method: UpdateMethod::Patch,
        }
    }

    pub fn config(&self) -> ResourceConfig {
        ResourceConfig::new(self.base_path).with_update_method(self.update_method)
    }
}

pub const RESOURCES: &[ResourceDef] = &[
    ResourceDef::patch("addresses", "/addresses"),
    ResourceDef::patch("bundle_items", "/bundle_items"),
    ResourceDef::patch("bundles", "/bundles"),
    ResourceDef::patch("cart_items", "/cart_items"),
    ResourceDef::patch("carts", "/carts"),
    ResourceDef::patch("categories", "/categories"),
    ResourceDef::patch("deliveries", "/deliveries"),
    ResourceDef::patch("inventories", "/inventories"),
    ResourceDef::patch("meal_plan_items", "/meal_plan_items"),
    ResourceDef::patch("meal_plans", "/meal_plans"),
    ResourceDef::patch("notifications", "/notifications"),
    ResourceDef::patch("order_items", "/order_items"),
    ResourceDef::patch("orders", "/orders"),
    ResourceDef::patch("payments", "/payments"),
    ResourceDef::patch("permissions", "/permissions"),
    ResourceDef::patch("product_categories", "/product_categories"),
    ResourceDef::patch("products", "/products"),
    ResourceDef::patch("recipe_items", "/recipe_items"),
    ResourceDef::patch("recipes", "/recipes"),
    ResourceDef::patch("reviews", "/reviews"),
    ResourceDef::patch("roles", "/roles"),
    ResourceDef {
        name: "users",
        base_path: "/users",
        update_method: UpdateMethod::Put,
    },
    ResourceDef::patch("vendors", "/vendors"),
];

/// Look a collection up by name (`cart_items`) or path (`/cart_items`).
pub fn find(name: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().find(|def| def.name == name || def.base_path == name)
}

fn def(name: &str) -> ResourceConfig {
    find(name).map(ResourceDef::config).unwrap_or_else(|| ResourceConfig::new(format!("/{name}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub unit_label: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Create/update body for products. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restock_amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Row of the product/category join table. Also its create payload: the
/// client picks the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: String,
    pub product_id: String,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Typed entry point to every admin collection.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn products(&self) -> Resource<Product, ProductPayload> {
        self.client.resource(def("products"))
    }

    pub fn categories(&self) -> Resource<Category, CategoryPayload> {
        self.client.resource(def("categories"))
    }

    pub fn product_categories(&self) -> Resource<ProductCategory> {
        self.client.resource(def("product_categories"))
    }

    pub fn users(&self) -> Resource<User, UserPayload> {
        self.client.resource(def("users"))
    }

    pub fn carts(&self) -> Resource<Cart, CartPayload> {
        self.client.resource(def("carts"))
    }

    /// Untyped access to any catalog collection.
    pub fn resource(&self, name: &str) -> Option<Resource<Record>> {
        find(name).map(|def| self.client.resource(def.config()))
    }
}
