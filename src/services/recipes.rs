//! Recipe writes, reads and image attachment.
//!
//! A recipe write validates every scalar field and every nested label name
//! first. Only then does it open a transaction that writes the recipe,
//! resolves label names (creating missing labels) and replaces the
//! supplied relation sets. A rejected write therefore leaves no labels
//! behind.

use std::collections::HashMap;

use sqlx::{Connection, Sqlite, Transaction};
use uuid::Uuid;

use crate::DbConn;
use crate::{
    error::{Error, FieldErrors, Result},
    models::{
        labels::{Label, LabelKind, LabelName, RecipeLabel},
        recipes::{
            Recipe, RecipeFields, RecipeFilter, RecipeFilterParams, RecipeImage, RecipePayload,
            RecipeRow, WriteMode,
        },
    },
    queries::{labels as label_queries, recipes},
    services::{
        labels::{get_or_create_labels, validate_label_names},
        storage::{ImageStorage, validate_image},
    },
    validation::{parse_id_list, validate_max_length, validate_required_text},
};

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";

/// A payload that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRecipe {
    pub fields: RecipeFields,
    /// Trimmed tag names, when the payload carried `tags`.
    pub tags: Option<Vec<String>>,
    /// Trimmed ingredient names, when the payload carried `ingredients`.
    pub ingredients: Option<Vec<String>>,
}

/// The supplied value of a payload key. An explicit `null` is recorded as an error.
fn supplied<'a, T>(errors: &mut FieldErrors, field: &str, value: &'a Option<Option<T>>) -> Option<&'a T> {
    match value {
        Some(Some(value)) => Some(value),
        Some(None) => {
            errors.add(field, NOT_NULL);
            None
        }
        None => None,
    }
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("Recipe with ID {} not found", id))
}

/// Validates a recipe payload against the stored row (if any) for the given mode.
///
/// Fields missing from the payload keep the stored value on updates. Create
/// and replace require `title`, `time_minutes` and `price`. All problems are
/// reported together.
pub fn validate_recipe(existing: Option<&RecipeRow>, payload: &RecipePayload, mode: WriteMode) -> Result<ValidatedRecipe> {
    let mut errors = FieldErrors::new();

    let title_in = supplied(&mut errors, "title", &payload.title);
    let time_minutes_in = supplied(&mut errors, "time_minutes", &payload.time_minutes).copied();
    let price_in = supplied(&mut errors, "price", &payload.price).copied();
    let description_in = supplied(&mut errors, "description", &payload.description);
    let link_in = supplied(&mut errors, "link", &payload.link);
    let tags_in = supplied(&mut errors, "tags", &payload.tags);
    let ingredients_in = supplied(&mut errors, "ingredients", &payload.ingredients);

    let title = match (title_in, existing) {
        (Some(title), _) => match validate_required_text(title, "title") {
            Ok(title) => Some(title),
            Err(Error::Validation(e)) => {
                errors.add("title", e.message_for("title").unwrap_or("Invalid title."));
                None
            }
            Err(e) => return Err(e),
        },
        (None, Some(row)) if !mode.requires_all() => Some(row.title.clone()),
        (None, _) => {
            errors.add("title", REQUIRED);
            None
        }
    };

    let time_minutes = match (time_minutes_in, existing) {
        (Some(minutes), _) => Some(minutes),
        (None, Some(row)) if !mode.requires_all() => Some(row.time_minutes),
        (None, _) => {
            errors.add("time_minutes", REQUIRED);
            None
        }
    };

    let price = match (price_in, existing) {
        (Some(price), _) => Some(price),
        (None, Some(row)) if !mode.requires_all() => Some(row.price),
        (None, _) => {
            errors.add("price", REQUIRED);
            None
        }
    };

    let description = match (description_in, existing) {
        (Some(description), _) => description.clone(),
        (None, Some(row)) => row.description.clone(),
        (None, None) => String::new(),
    };

    let link = match (link_in, existing) {
        (Some(link), _) => {
            let link = link.trim().to_string();
            if let Err(Error::Validation(e)) = validate_max_length(&link, "link") {
                errors.add("link", e.message_for("link").unwrap_or("Invalid link."));
            }
            link
        }
        (None, Some(row)) => row.link.clone(),
        (None, None) => String::new(),
    };

    let mut label_names = |kind: LabelKind, names: Option<&Vec<LabelName>>| {
        let names = names?;
        match validate_label_names(kind, names) {
            Ok(validated) => Some(validated),
            Err(Error::Validation(e)) => {
                errors.add(kind.plural(), e.message_for(kind.plural()).unwrap_or("Invalid name."));
                None
            }
            Err(_) => None,
        }
    };
    let tags = label_names(LabelKind::Tag, tags_in);
    let ingredients = label_names(LabelKind::Ingredient, ingredients_in);

    errors.into_result()?;

    match (title, time_minutes, price) {
        (Some(title), Some(time_minutes), Some(price)) => Ok(ValidatedRecipe {
            fields: RecipeFields {
                title,
                time_minutes,
                price,
                description,
                link,
            },
            tags,
            ingredients,
        }),
        _ => Err(Error::Internal("Recipe validation left a required field unset".to_string())),
    }
}

/// Parses the list query parameters. Empty values mean no filter.
pub fn parse_recipe_filter(params: &RecipeFilterParams) -> Result<RecipeFilter> {
    let parse = |value: Option<&str>, field: &str| -> Result<Option<Vec<i64>>> {
        match value.map(str::trim) {
            Some(value) if !value.is_empty() => parse_id_list(value, field).map(Some),
            _ => Ok(None),
        }
    };

    Ok(RecipeFilter {
        tag_ids: parse(params.tags.as_deref(), "tags")?,
        ingredient_ids: parse(params.ingredients.as_deref(), "ingredients")?,
    })
}

/// Creates a recipe owned by the caller.
pub async fn create_recipe(conn: &mut DbConn, user_id: Uuid, payload: RecipePayload) -> Result<Recipe> {
    let validated = validate_recipe(None, &payload, WriteMode::Create)?;

    let mut tx = begin_write(conn).await?;

    let row = recipes::create_recipe(&mut tx, user_id, &validated.fields).await?;
    apply_labels(&mut tx, user_id, row.id, &validated).await?;
    let recipe = hydrate_one(&mut tx, row).await?;

    tx.commit().await.map_err(|e| {
        Error::Internal(format!("Failed to commit transaction: {}", e))
    })?;

    tracing::info!(operation = "create_recipe", user_id = %user_id, recipe_id = recipe.id, "Recipe created");
    Ok(recipe)
}

/// Updates one of the caller's recipes.
///
/// `WriteMode::Replace` requires the same fields as a create;
/// `WriteMode::Partial` changes only what the payload carries. In both modes
/// a `tags` or `ingredients` key replaces that relation set and a missing
/// key leaves it alone.
pub async fn update_recipe(
    conn: &mut DbConn,
    user_id: Uuid,
    id: i64,
    payload: RecipePayload,
    mode: WriteMode,
) -> Result<Recipe> {
    let mut tx = begin_write(conn).await?;

    let existing = recipes::get_recipe(&mut tx, user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let validated = validate_recipe(Some(&existing), &payload, mode)?;

    let row = recipes::update_recipe(&mut tx, user_id, id, &validated.fields)
        .await?
        .ok_or_else(|| not_found(id))?;
    apply_labels(&mut tx, user_id, row.id, &validated).await?;
    let recipe = hydrate_one(&mut tx, row).await?;

    tx.commit().await.map_err(|e| {
        Error::Internal(format!("Failed to commit transaction: {}", e))
    })?;

    tracing::info!(operation = "update_recipe", user_id = %user_id, recipe_id = id, mode = ?mode, "Recipe updated");
    Ok(recipe)
}

/// Opens a transaction that holds the database write lock from `BEGIN`.
/// Concurrent writers wait on the busy timeout and apply in turn.
async fn begin_write(conn: &mut DbConn) -> Result<Transaction<'_, Sqlite>> {
    conn.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))
}

async fn apply_labels(conn: &mut DbConn, user_id: Uuid, recipe_id: i64, validated: &ValidatedRecipe) -> Result<()> {
    let sets = [
        (LabelKind::Tag, validated.tags.as_deref()),
        (LabelKind::Ingredient, validated.ingredients.as_deref()),
    ];

    for (kind, names) in sets {
        let Some(names) = names else { continue };
        let ids = get_or_create_labels(conn, kind, user_id, names).await?;
        label_queries::set_recipe_labels(conn, kind, recipe_id, &ids).await?;
    }

    Ok(())
}

/// Gets one of the caller's recipes with its tags and ingredients.
pub async fn get_recipe(conn: &mut DbConn, user_id: Uuid, id: i64) -> Result<Recipe> {
    let row = recipes::get_recipe(conn, user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    hydrate_one(conn, row).await
}

/// Lists the caller's recipes, newest first, applying the tag/ingredient filters.
pub async fn list_recipes(conn: &mut DbConn, user_id: Uuid, params: &RecipeFilterParams) -> Result<Vec<Recipe>> {
    let filter = parse_recipe_filter(params)?;
    let rows = recipes::list_recipes(conn, user_id, &filter).await?;

    hydrate(conn, rows).await
}

/// Deletes one of the caller's recipes along with its image file.
pub async fn delete_recipe(conn: &mut DbConn, storage: &ImageStorage, user_id: Uuid, id: i64) -> Result<()> {
    let row = recipes::get_recipe(conn, user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    if recipes::delete_recipe(conn, user_id, id).await? == 0 {
        return Err(not_found(id));
    }

    if let Some(image) = row.image.as_deref() {
        if let Err(e) = storage.remove(image).await {
            tracing::warn!(operation = "delete_recipe", recipe_id = id, error = %e, "Failed to remove recipe image");
        }
    }

    tracing::info!(operation = "delete_recipe", user_id = %user_id, recipe_id = id, "Recipe deleted");
    Ok(())
}

/// Stores `content` as the recipe's image, replacing any previous one.
///
/// Content that does not decode as an image is rejected and the recipe
/// keeps its current image.
pub async fn upload_image(
    conn: &mut DbConn,
    storage: &ImageStorage,
    user_id: Uuid,
    id: i64,
    content: &[u8],
) -> Result<RecipeImage> {
    let existing = recipes::get_recipe(conn, user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let extension = validate_image(content)?;
    let relative = storage.save_recipe_image(content, extension).await?;

    let row = match recipes::set_recipe_image(conn, user_id, id, Some(&relative)).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            storage.remove(&relative).await?;
            return Err(not_found(id));
        }
        Err(e) => {
            storage.remove(&relative).await?;
            return Err(e);
        }
    };

    if let Some(previous) = existing.image.as_deref() {
        if previous != relative {
            if let Err(e) = storage.remove(previous).await {
                tracing::warn!(operation = "upload_image", recipe_id = id, error = %e, "Failed to remove previous image");
            }
        }
    }

    tracing::info!(operation = "upload_image", user_id = %user_id, recipe_id = id, path = %relative, "Recipe image uploaded");
    Ok(RecipeImage::from(&row))
}

async fn hydrate_one(conn: &mut DbConn, row: RecipeRow) -> Result<Recipe> {
    let id = row.id;
    hydrate(conn, vec![row])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(id))
}

/// Attaches tags and ingredients to each row, keeping the row order.
async fn hydrate(conn: &mut DbConn, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

    let mut tags = group_by_recipe(label_queries::labels_for_recipes(conn, LabelKind::Tag, &ids).await?);
    let mut ingredients =
        group_by_recipe(label_queries::labels_for_recipes(conn, LabelKind::Ingredient, &ids).await?);

    Ok(rows
        .into_iter()
        .map(|row| {
            let row_tags = tags.remove(&row.id).unwrap_or_default();
            let row_ingredients = ingredients.remove(&row.id).unwrap_or_default();
            Recipe::from_row(row, row_tags, row_ingredients)
        })
        .collect())
}

fn group_by_recipe(rows: Vec<RecipeLabel>) -> HashMap<i64, Vec<Label>> {
    let mut grouped: HashMap<i64, Vec<Label>> = HashMap::new();
    for row in rows {
        grouped.entry(row.recipe_id).or_default().push(Label::from(row));
    }
    grouped
}
