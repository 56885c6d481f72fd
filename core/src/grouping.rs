//! Product/category joins computed client-side.
//!
//! Products carry an optional direct `category_id`, and the
//! `product_categories` join table links products to any number of
//! categories. Both are resolved here in memory from plain `list()` results.

use std::collections::BTreeMap;

use tracing::warn;
use uuid::Uuid;

use crate::catalog::{Product, ProductCategory};
use crate::error::ApiError;
use crate::resource::Resource;

pub const UNCATEGORIZED: &str = "uncategorized";

/// Products keyed by `category_id`, listing order kept inside each group.
pub fn group_by_category(products: Vec<Product>) -> BTreeMap<String, Vec<Product>> {
    let mut grouped: BTreeMap<String, Vec<Product>> = BTreeMap::new();
    for product in products {
        let key = product
            .category_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        grouped.entry(key).or_default().push(product);
    }
    grouped
}

/// Category ids linked to `product_id` through the join table.
pub fn category_ids_for(product_id: &str, links: &[ProductCategory]) -> Vec<String> {
    links
        .iter()
        .filter(|link| link.product_id == product_id)
        .map(|link| link.category_id.clone())
        .collect()
}

/// Changes that make a product's links match a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySyncPlan {
    /// Category ids that need a new link.
    pub to_add: Vec<String>,
    /// Ids of link rows to delete.
    pub to_remove: Vec<String>,
}

impl CategorySyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

pub fn plan_category_sync(product_id: &str, links: &[ProductCategory], selected: &[String]) -> CategorySyncPlan {
    let current: Vec<&ProductCategory> = links.iter().filter(|l| l.product_id == product_id).collect();

    let mut to_add = Vec::new();
    for category_id in selected {
        if !current.iter().any(|l| &l.category_id == category_id) && !to_add.contains(category_id) {
            to_add.push(category_id.clone());
        }
    }

    let to_remove = current
        .iter()
        .filter(|l| !selected.contains(&l.category_id))
        .map(|l| l.id.clone())
        .collect();

    CategorySyncPlan { to_add, to_remove }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySyncReport {
    pub added: usize,
    pub removed: usize,
    /// One message per link that could not be created or deleted.
    pub failures: Vec<String>,
}

/// Bring `product_id`'s category links in line with `selected`. Only the
/// initial listing can fail the call; a failed create or delete is logged,
/// recorded in the report and skipped.
pub fn sync_product_categories(
    links: &Resource<ProductCategory>,
    product_id: &str,
    selected: &[String],
) -> Result<CategorySyncReport, ApiError> {
    let current = links.list()?.into_items();
    let plan = plan_category_sync(product_id, &current, selected);
    let mut report = CategorySyncReport::default();

    for category_id in plan.to_add {
        let link = ProductCategory {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            category_id,
        };
        match links.create(&link) {
            Ok(_) => report.added += 1,
            Err(e) => {
                warn!(product_id, category_id = %link.category_id, error = %e, "failed to add category");
                report.failures.push(format!("add {}: {e}", link.category_id));
            }
        }
    }

    for link_id in plan.to_remove {
        match links.delete(&link_id) {
            Ok(_) => report.removed += 1,
            Err(e) => {
                warn!(product_id, link_id = %link_id, error = %e, "failed to remove category");
                report.failures.push(format!("remove {link_id}: {e}"));
            }
        }
    }

    Ok(report)
}
