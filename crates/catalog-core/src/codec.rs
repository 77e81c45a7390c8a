//! Cached representation of products

use crate::error::SerializationError;
use catalog_types::{Product, ProductId};

/// Cache field under which a product is stored.
pub fn field_key(id: ProductId) -> String {
    id.to_string()
}

pub fn encode(product: &Product) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(product)?)
}

pub fn decode(raw: &str) -> Result<Product, SerializationError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key_is_decimal_id() {
        assert_eq!(field_key(42), "42");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"id":1}"#).is_err());
    }

    #[test]
    fn test_encoded_product_decodes_to_itself() {
        let product = Product::new("Chair", 55.0).with_weight(7.5).with_id(9);
        let raw = encode(&product).unwrap();
        assert_eq!(decode(&raw).unwrap(), product);
    }
}
