use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::{
    labels::{Label, LabelName},
    price::Price,
};

/// A recipe row without its relations.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    #[sqlx(rename = "price_cents")]
    pub price: Price,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full recipe with resolved tags and ingredients.
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<Label>,
    pub ingredients: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn from_row(row: RecipeRow, tags: Vec<Label>, ingredients: Vec<Label>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            time_minutes: row.time_minutes,
            price: row.price,
            description: row.description,
            link: row.link,
            image: row.image,
            tags,
            ingredients,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// List representation: no description or image.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub tags: Vec<Label>,
    pub ingredients: Vec<Label>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }
    }
}

/// Detail representation, with the image exposed as a media URL.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<Label>,
    pub ingredients: Vec<Label>,
}

impl From<Recipe> for RecipeDetail {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            description: recipe.description,
            image: recipe.image.as_deref().map(media_url),
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }
    }
}

/// Response of the image upload endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeImage {
    pub id: i64,
    pub image: Option<String>,
}

impl From<&RecipeRow> for RecipeImage {
    fn from(row: &RecipeRow) -> Self {
        Self {
            id: row.id,
            image: row.image.as_deref().map(media_url),
        }
    }
}

/// Public URL for a path relative to the media root.
pub fn media_url(relative: &str) -> String {
    format!("/media/{}", relative.trim_start_matches('/'))
}

/// Incoming recipe body for create, replace and partial update.
///
/// Every field is optional at the type level; which ones are required
/// depends on the write mode. The outer `Option` records whether the key
/// was sent and the inner one whether it was `null`, which is rejected.
/// Unknown keys (including `user`) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipePayload {
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub time_minutes: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub price: Option<Option<Price>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Option<Option<Vec<LabelName>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub ingredients: Option<Option<Vec<LabelName>>>,
}

/// A present key becomes `Some`, so an explicit `null` is `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Scalar values validated and ready to write.
#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub description: String,
    pub link: String,
}

/// How a recipe write treats missing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// New recipe; required fields must be present.
    Create,
    /// Full update; required fields must be present.
    Replace,
    /// Partial update; only supplied fields change.
    Partial,
}

impl WriteMode {
    pub fn requires_all(self) -> bool {
        matches!(self, WriteMode::Create | WriteMode::Replace)
    }
}

/// Recipe list filter: `?tags=1,2&ingredients=3`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilterParams {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// Parsed recipe list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_distinguishes_null_from_missing() {
        let payload: RecipePayload =
            serde_json::from_str(r#"{"title": "Soup", "price": null, "tags": []}"#).unwrap();

        assert_eq!(payload.title, Some(Some("Soup".to_string())));
        assert!(matches!(payload.price, Some(None)));
        assert!(matches!(payload.tags, Some(Some(ref tags)) if tags.is_empty()));
        assert!(payload.ingredients.is_none());
        assert!(payload.time_minutes.is_none());
    }
}
