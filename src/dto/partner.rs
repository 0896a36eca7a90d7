use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PartnerStateRequest {
    #[schema(value_type = Object)]
    pub state: Option<Value>,
}

/// Price list uploaded by a partner, YAML or JSON.
#[derive(Debug, Deserialize)]
pub struct CatalogFeed {
    pub shop: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub categories: Vec<FeedCategory>,
    #[serde(default)]
    pub goods: Vec<FeedGood>,
}

#[derive(Debug, Deserialize)]
pub struct FeedCategory {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedGood {
    pub id: i64,
    pub category: i32,
    #[serde(default)]
    pub model: String,
    pub name: String,
    pub price: i64,
    pub price_rrc: i64,
    pub quantity: i32,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

impl CatalogFeed {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let feed: CatalogFeed = serde_yaml::from_str(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid catalog feed: {e}")))?;
        feed.check()?;
        Ok(feed)
    }

    fn check(&self) -> AppResult<()> {
        if self.shop.trim().is_empty() {
            return Err(AppError::BadRequest("Feed has no shop name".into()));
        }
        let declared: HashSet<i32> = self.categories.iter().map(|c| c.id).collect();
        let mut seen = HashSet::new();
        for good in &self.goods {
            if !declared.contains(&good.category) {
                return Err(AppError::BadRequest(format!(
                    "Good {} refers to undeclared category {}",
                    good.id, good.category
                )));
            }
            if good.price < 0 || good.price_rrc < 0 || good.quantity < 0 {
                return Err(AppError::BadRequest(format!(
                    "Good {} has a negative price or quantity",
                    good.id
                )));
            }
            if !seen.insert((good.id, good.name.as_str(), good.category)) {
                return Err(AppError::BadRequest(format!("Good {} is listed twice", good.id)));
            }
        }
        Ok(())
    }
}

/// Scalar parameter values are stored as text.
pub fn parameter_text(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct ImportSummary {
    pub shop_id: i32,
    pub categories: u64,
    pub products: u64,
    pub listings: u64,
    pub removed_listings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"
shop: Svyaznoy
categories:
  - id: 224
    name: Smartphones
goods:
  - id: 4216292
    category: 224
    model: apple/iphone/xs-max
    name: Apple iPhone XS Max 512GB (gold)
    price: 110000
    price_rrc: 116990
    quantity: 14
    parameters:
      "Diagonal (inch)": 6.5
      "Resolution (px)": 2688x1242
      "Memory (GB)": 512
"#;

    #[test]
    fn parses_yaml_feed_with_mixed_parameter_types() {
        let feed = CatalogFeed::parse(FEED).unwrap();
        assert_eq!(feed.shop, "Svyaznoy");
        assert_eq!(feed.goods.len(), 1);
        let params: Vec<String> = feed.goods[0].parameters.values().map(parameter_text).collect();
        assert_eq!(params, vec!["6.5", "512", "2688x1242"]);
    }

    #[test]
    fn json_feeds_are_accepted_too() {
        let feed = CatalogFeed::parse(
            r#"{"shop": "S", "categories": [{"id": 1, "name": "C"}], "goods": []}"#,
        )
        .unwrap();
        assert_eq!(feed.categories[0].name, "C");
    }

    #[test]
    fn goods_must_use_declared_categories() {
        let raw = FEED.replace("category: 224", "category: 999");
        assert!(matches!(CatalogFeed::parse(&raw), Err(AppError::BadRequest(_))));
    }
}
