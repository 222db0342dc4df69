//! Demo product catalog for the shopping-cart flow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::CartItem;
use crate::errors::ItemError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl Product {
    fn new(id: &str, name: &str, price: Decimal, image: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
            image: image.to_string(),
        }
    }

    /// The cart line for `quantity` units of this product.
    pub fn to_item(&self, quantity: u32) -> Result<CartItem, ItemError> {
        CartItem::new(
            self.id.clone(),
            self.name.clone(),
            self.price,
            quantity,
            self.image.clone(),
        )
    }
}

pub fn demo_products() -> Vec<Product> {
    vec![
        Product::new(
            "p1",
            "Wireless Headphones",
            Decimal::new(5999, 2),
            "https://via.placeholder.com/200x150?text=Headphones",
        ),
        Product::new(
            "p2",
            "Gaming Mouse",
            Decimal::new(3995, 2),
            "https://via.placeholder.com/200x150?text=Mouse",
        ),
        Product::new(
            "p3",
            "Mechanical Keyboard",
            Decimal::new(8900, 2),
            "https://via.placeholder.com/200x150?text=Keyboard",
        ),
    ]
}

/// Look up a product by id, case-insensitively.
pub fn find_product(id: &str) -> Result<Product, ItemError> {
    demo_products()
        .into_iter()
        .find(|p| p.id.eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| ItemError::UnknownProduct(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_product_case_insensitive() {
        let p = find_product(" P2 ").unwrap();
        assert_eq!(p.name, "Gaming Mouse");
    }

    #[test]
    fn test_find_unknown_product() {
        assert_eq!(
            find_product("p9").unwrap_err(),
            ItemError::UnknownProduct("p9".to_string())
        );
    }

    #[test]
    fn test_to_item_copies_fields() {
        let item = find_product("p3").unwrap().to_item(2).unwrap();
        assert_eq!(item.id, "p3");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price, Decimal::new(8900, 2));
        assert!(item.image.contains("Keyboard"));
    }

    #[test]
    fn test_to_item_rejects_zero_quantity() {
        assert!(find_product("p1").unwrap().to_item(0).is_err());
    }
}
