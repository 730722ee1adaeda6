//! Client-side cart model.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s keyed by
//! `(product_id, variant_id)`. The mutation methods here keep two rules:
//!
//! - add/increment/decrement/remove never produce two lines for the same
//!   `(product_id, variant_id)` pair;
//! - every line present has `quantity >= 1`.
//!
//! [`Cart::append`] is the exception to the first rule: it is used when a
//! guest cart is folded into an owner cart on login and intentionally keeps
//! lines side by side instead of summing them.
//!
//! The serialized form matches what the storefront has always written to
//! client storage, so carts persisted by older clients keep loading.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{ProductId, VariantId};

/// One product variant and its quantity in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    #[serde(rename = "variantId")]
    pub variant_id: VariantId,
    /// Always at least 1 for a line held in a [`Cart`].
    #[serde(rename = "qty")]
    pub quantity: u32,
    /// Price per unit at the time the line was added.
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "name", default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(rename = "image_url", default, deserialize_with = "null_as_default")]
    pub image_ref: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
}

impl CartLine {
    /// Whether this line is for the given product variant.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        &self.product_id == product_id && &self.variant_id == variant_id
    }

    /// `quantity * unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Input for adding a product variant to a cart.
///
/// `quantity` defaults to 1 when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    #[serde(rename = "variantId")]
    pub variant_id: VariantId,
    #[serde(rename = "qty", default)]
    pub quantity: Option<u32>,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(rename = "image_url", default)]
    pub image_ref: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

impl CartLineInput {
    /// Minimal input for a variant; descriptive fields are left empty.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        variant_id: impl Into<VariantId>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: variant_id.into(),
            quantity: None,
            unit_price,
            display_name: String::new(),
            image_ref: String::new(),
            size: String::new(),
            color: String::new(),
        }
    }

    /// Set the quantity to add.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    fn into_line(self, quantity: u32) -> CartLine {
        CartLine {
            product_id: self.product_id,
            variant_id: self.variant_id,
            quantity,
            unit_price: self.unit_price,
            display_name: self.display_name,
            image_ref: self.image_ref,
            size: self.size,
            color: self.color,
        }
    }
}

/// An ordered collection of cart lines belonging to one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from persisted lines, dropping any with zero quantity.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self {
            lines: lines.into_iter().filter(|l| l.quantity > 0).collect(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Find the line for a product variant.
    #[must_use]
    pub fn find(&self, product_id: &ProductId, variant_id: &VariantId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(product_id, variant_id))
    }

    /// Whether the cart holds the given product variant.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        self.find(product_id, variant_id).is_some()
    }

    /// Increment the matching line by `input.quantity` (default 1), or append
    /// a new line.
    ///
    /// An explicit quantity of zero adds nothing.
    pub fn add_or_increment(&mut self, input: CartLineInput) {
        let quantity = input.quantity.unwrap_or(1);
        if quantity == 0 {
            return;
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(&input.product_id, &input.variant_id))
        {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(input.into_line(quantity));
        }
    }

    /// Decrease the matching line by `by`, removing it if nothing would remain.
    ///
    /// Returns `true` if the cart changed.
    pub fn decrement_or_remove(
        &mut self,
        product_id: &ProductId,
        variant_id: &VariantId,
        by: u32,
    ) -> bool {
        if by == 0 {
            return false;
        }

        let Some(index) = self
            .lines
            .iter()
            .position(|l| l.matches(product_id, variant_id))
        else {
            return false;
        };

        match self.lines.get_mut(index) {
            Some(line) if line.quantity > by => line.quantity -= by,
            Some(_) => {
                self.lines.remove(index);
            }
            None => return false,
        }
        true
    }

    /// Remove every line for a product variant.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&mut self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, variant_id));
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Append another cart's lines after this cart's lines, without merging
    /// lines that share a product variant.
    pub fn append(&mut self, other: Self) {
        self.lines.extend(other.lines);
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of `quantity * unit_price` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Requested units per variant, summed across lines sharing a variant.
    #[must_use]
    pub fn quantities_by_variant(&self) -> BTreeMap<VariantId, u64> {
        let mut requested = BTreeMap::new();
        for line in &self.lines {
            *requested.entry(line.variant_id.clone()).or_insert(0) += u64::from(line.quantity);
        }
        requested
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(product: &str, variant: &str) -> CartLineInput {
        CartLineInput::new(product, variant, Decimal::new(4999, 2))
    }

    fn quantity_of(cart: &Cart, product: &str, variant: &str) -> Option<u32> {
        cart.find(&product.into(), &variant.into())
            .map(|l| l.quantity)
    }

    #[test]
    fn test_add_defaults_quantity_to_one() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1"));
        assert_eq!(quantity_of(&cart, "p1", "v1"), Some(1));
    }

    #[test]
    fn test_add_existing_increments() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1"));
        cart.add_or_increment(input("p1", "v1").with_quantity(3));
        assert_eq!(cart.len(), 1);
        assert_eq!(quantity_of(&cart, "p1", "v1"), Some(4));
    }

    #[test]
    fn test_same_product_different_variant_is_separate_line() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1"));
        cart.add_or_increment(input("p1", "v2"));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1").with_quantity(0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_quantity_two_keeps_line() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1").with_quantity(2));
        assert!(cart.decrement_or_remove(&"p1".into(), &"v1".into(), 1));
        assert_eq!(quantity_of(&cart, "p1", "v1"), Some(1));
    }

    #[test]
    fn test_decrement_quantity_one_removes_line() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1"));
        assert!(cart.decrement_or_remove(&"p1".into(), &"v1".into(), 1));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_past_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1").with_quantity(2));
        cart.decrement_or_remove(&"p1".into(), &"v1".into(), 5);
        assert!(!cart.contains(&"p1".into(), &"v1".into()));
    }

    #[test]
    fn test_decrement_missing_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.decrement_or_remove(&"p1".into(), &"v1".into(), 1));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new();
        cart.add_or_increment(input("p1", "v1"));
        assert!(!cart.remove(&"p2".into(), &"v2".into()));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_operation_sequences_keep_invariants() {
        #[derive(Clone, Copy)]
        enum Op {
            Add(u32),
            Dec(u32),
            Remove,
        }

        let variants = [("p1", "v1"), ("p1", "v2"), ("p2", "v3")];
        let ops = [Op::Add(1), Op::Add(3), Op::Dec(1), Op::Dec(4), Op::Remove];

        // Walk a deterministic pseudo-random sequence of operations.
        let mut cart = Cart::new();
        let mut seed: usize = 7;
        for _ in 0..500 {
            seed = (seed * 31 + 17) % 1009;
            let (product, variant) = variants[seed % variants.len()];
            match ops[(seed / 3) % ops.len()] {
                Op::Add(n) => cart.add_or_increment(input(product, variant).with_quantity(n)),
                Op::Dec(n) => {
                    cart.decrement_or_remove(&product.into(), &variant.into(), n);
                }
                Op::Remove => {
                    cart.remove(&product.into(), &variant.into());
                }
            }

            assert!(cart.lines().iter().all(|l| l.quantity >= 1));
            for (product, variant) in variants {
                let count = cart
                    .lines()
                    .iter()
                    .filter(|l| l.matches(&product.into(), &variant.into()))
                    .count();
                assert!(count <= 1, "duplicate line for {product}/{variant}");
            }
        }
    }

    #[test]
    fn test_append_keeps_duplicates_in_order() {
        let mut owner = Cart::new();
        owner.add_or_increment(input("p1", "v1"));
        let mut guest = Cart::new();
        guest.add_or_increment(input("p1", "v1").with_quantity(2));

        owner.append(guest);

        assert_eq!(owner.len(), 2);
        assert_eq!(owner.lines()[0].quantity, 1);
        assert_eq!(owner.lines()[1].quantity, 2);
        assert_eq!(owner.quantities_by_variant().get(&"v1".into()), Some(&3));
    }

    #[test]
    fn test_subtotal() {
        let mut cart = Cart::new();
        cart.add_or_increment(CartLineInput::new("p1", "v1", Decimal::from(100)).with_quantity(2));
        cart.add_or_increment(CartLineInput::new("p2", "v2", Decimal::new(2550, 2)));
        assert_eq!(cart.subtotal(), Decimal::new(22550, 2));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_deserializes_persisted_format() {
        let json = r#"[
            {"productId": 3, "variantId": "3_M", "qty": 2, "price": 499.5,
             "name": "Tee", "image_url": null, "size": "M", "color": "N/A"},
            {"productId": 4, "variantId": 9, "qty": 0, "price": 10}
        ]"#;
        let lines: Vec<CartLine> = serde_json::from_str(json).expect("parse");
        let cart = Cart::from_lines(lines);

        assert_eq!(cart.len(), 1);
        let line = &cart.lines()[0];
        assert_eq!(line.product_id.as_str(), "3");
        assert_eq!(line.variant_id.as_str(), "3_M");
        assert_eq!(line.unit_price, Decimal::new(4995, 1));
        assert_eq!(line.image_ref, "");
    }
}
