//! Catalog types: categories, products and their variants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopkart_core::{CartLineInput, ProductId, VariantId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A purchasable variant of a product (size/color combination).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub stock: i64,
    pub price: Decimal,
}

impl ProductVariant {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A catalog product. Listings omit variants; the detail endpoint fills them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Listing price. Variants carry their own.
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    #[must_use]
    pub fn variant(&self, variant_id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == variant_id)
    }

    /// Cart input for one of this product's variants, priced from the
    /// variant and labelled from the product.
    #[must_use]
    pub fn line_input(&self, variant: &ProductVariant) -> CartLineInput {
        let mut input = CartLineInput::new(self.id.clone(), variant.id.clone(), variant.price)
            .with_name(self.name.as_str());
        input.image_ref = self.image_url.clone().unwrap_or_default();
        input.size = variant.size.clone().unwrap_or_default();
        input.color = variant.color.clone().unwrap_or_default();
        input
    }
}

/// Filters for the product listing. Unset filters are left out of the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub min_price: Option<Decimal>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub max_price: Option<Decimal>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            category_id: None,
            brand: None,
            min_price: None,
            max_price: None,
            limit: 10,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"{
        "id": 3, "name": "Organic Tee", "brand": "Kora", "description": null,
        "price": 499.0, "category_id": 2, "image_url": "https://img.test/tee.png",
        "variants": [
            {"id": 7, "product_id": 3, "sku": "TEE-M", "size": "M", "color": "Black", "stock": 4, "price": "499.00"},
            {"id": 8, "product_id": 3, "sku": "TEE-L", "size": "L", "color": "Black", "stock": 0, "price": 549.5}
        ]
    }"#;

    #[test]
    fn test_product_detail_from_backend_json() {
        let product: Product = serde_json::from_str(DETAIL).expect("parse");
        assert_eq!(product.id.as_str(), "3");
        assert_eq!(product.variants.len(), 2);

        let large = product.variant(&VariantId::new("8")).expect("variant 8");
        assert_eq!(large.price, Decimal::new(5495, 1));
        assert!(!large.in_stock());
    }

    #[test]
    fn test_listing_without_variants() {
        let products: Vec<Product> = serde_json::from_str(
            r#"[{"id": 1, "name": "Cap", "brand": "Kora", "description": "Wool", "price": 250, "category_id": 1, "image_url": null}]"#,
        )
        .expect("parse");
        assert!(products[0].variants.is_empty());
        assert_eq!(products[0].price, Decimal::from(250));
    }

    #[test]
    fn test_line_input_uses_variant_price_and_options() {
        let product: Product = serde_json::from_str(DETAIL).expect("parse");
        let variant = product.variant(&VariantId::new("7")).expect("variant 7");
        let input = product.line_input(variant);

        assert_eq!(input.product_id.as_str(), "3");
        assert_eq!(input.unit_price, Decimal::from(499));
        assert_eq!(input.display_name, "Organic Tee");
        assert_eq!(input.size, "M");
        assert_eq!(input.image_ref, "https://img.test/tee.png");
        assert_eq!(input.quantity, None);
    }

    #[test]
    fn test_query_skips_unset_filters() {
        let query = ProductQuery {
            search: Some("tee".to_string()),
            max_price: Some(Decimal::from(600)),
            ..ProductQuery::default()
        };
        let value = serde_json::to_value(&query).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"search": "tee", "max_price": 600.0, "limit": 10, "offset": 0})
        );
    }
}
