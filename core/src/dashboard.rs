//! Summary figures for the CRM landing page and the analytics screen.

use std::thread;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::catalog::{AdminApi, Cart, Product, User};
use crate::resource::Resource;

const PAID_STATUSES: [&str; 2] = ["completed", "paid"];
const ACTIVE_STATUSES: [&str; 2] = ["pending", "active"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub customers: usize,
    pub orders: usize,
    /// Carts that are `completed` or `paid`.
    pub completed_orders: usize,
    /// Carts that are `pending` or `active`.
    pub active_orders: usize,
    pub revenue: f64,
    /// Revenue per completed order, 0 when nothing is completed.
    pub average_order_value: f64,
    pub products: usize,
}

impl DashboardStats {
    pub fn from_lists(users: &[User], carts: &[Cart], products: &[Product]) -> Self {
        let completed: Vec<&Cart> = carts.iter().filter(|c| has_status(c, &PAID_STATUSES)).collect();
        let revenue: f64 = completed.iter().map(|c| c.total.unwrap_or(0.0)).sum();
        let average_order_value = if completed.is_empty() {
            0.0
        } else {
            revenue / completed.len() as f64
        };
        let active_orders = carts.iter().filter(|c| has_status(c, &ACTIVE_STATUSES)).count();

        Self {
            customers: users.len(),
            orders: carts.len(),
            completed_orders: completed.len(),
            active_orders,
            revenue,
            average_order_value,
            products: products.len(),
        }
    }
}

/// List users, carts and products in parallel and summarize them. A
/// collection that fails to load counts as empty.
pub fn load_dashboard(api: &AdminApi) -> DashboardStats {
    let (users, carts, products) = (api.users(), api.carts(), api.products());
    let (users, carts, products) = thread::scope(|s| {
        let users = s.spawn(|| list_or_empty(&users));
        let carts = s.spawn(|| list_or_empty(&carts));
        let products = s.spawn(|| list_or_empty(&products));
        (joined(users.join()), joined(carts.join()), joined(products.join()))
    });
    DashboardStats::from_lists(&users, &carts, &products)
}

fn has_status(cart: &Cart, statuses: &[&str]) -> bool {
    cart.status
        .as_deref()
        .is_some_and(|status| statuses.iter().any(|s| *s == status))
}

fn list_or_empty<T, C, U>(resource: &Resource<T, C, U>) -> Vec<T>
where
    T: DeserializeOwned,
    C: Serialize,
    U: Serialize,
{
    match resource.list() {
        Ok(envelope) => envelope.into_items(),
        Err(e) => {
            let path = resource.config().base_path.as_str();
            warn!(path, error = %e, "dashboard list failed, counting as empty");
            Vec::new()
        }
    }
}

fn joined<T>(result: thread::Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|_| {
        warn!("dashboard worker panicked, counting as empty");
        Vec::new()
    })
}
