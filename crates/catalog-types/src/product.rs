//! Product types

use serde::{Deserialize, Serialize};

/// Identifier assigned by the durable store. Zero means "not yet created".
pub type ProductId = i64;

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

fn is_unassigned(id: &ProductId) -> bool {
    *id == 0
}

impl Product {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            image_url: String::new(),
            price,
            weight: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Copy of this product carrying the given id.
    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = id;
        self
    }

    /// Whether the durable store has assigned an id yet.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_id_is_omitted() {
        let product = Product::new("Kettle", 24.5);
        let json = serde_json::to_value(&product).unwrap();

        assert!(json.get("id").is_none());
        assert!(json.get("weight").is_none());
        assert_eq!(json["name"], "Kettle");
    }

    #[test]
    fn test_optional_fields_default_when_missing() {
        let product: Product =
            serde_json::from_str(r#"{"name":"Mug","price":3.0}"#).unwrap();

        assert_eq!(product.id, 0);
        assert_eq!(product.description, "");
        assert_eq!(product.image_url, "");
        assert_eq!(product.weight, None);
        assert!(!product.is_persisted());
    }

    #[test]
    fn test_name_and_price_are_required() {
        assert!(serde_json::from_str::<Product>(r#"{"price":3.0}"#).is_err());
        assert!(serde_json::from_str::<Product>(r#"{"name":"Mug"}"#).is_err());
    }

    #[test]
    fn test_persisted_product_keeps_all_fields() {
        let product = Product::new("Lamp", 40.0)
            .with_description("Desk lamp")
            .with_image_url("https://img.example/lamp.png")
            .with_weight(1.25)
            .with_id(7);

        let json = serde_json::to_string(&product).unwrap();
        let decoded: Product = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, product);
        assert!(decoded.is_persisted());
    }
}
