use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::{
        labels::LabelKind,
        recipes::{RecipeFields, RecipeFilter, RecipeRow},
    },
};

use crate::DbConn;

const RECIPE_COLUMNS: &str = "r.id, r.user_id, r.title, r.time_minutes, r.price_cents, r.description, r.link, r.image, r.created_at, r.updated_at";

/// Creates a new recipe owned by `user_id`.
pub async fn create_recipe(conn: &mut DbConn, user_id: Uuid, fields: &RecipeFields) -> Result<RecipeRow> {
    let now = Utc::now();
    let recipe = sqlx::query_as::<_, RecipeRow>(
        r#"
        INSERT INTO recipes (user_id, title, time_minutes, price_cents, description, link, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING id, user_id, title, time_minutes, price_cents, description, link, image, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(&fields.title)
    .bind(fields.time_minutes)
    .bind(fields.price)
    .bind(&fields.description)
    .bind(&fields.link)
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(recipe)
}

/// Gets a recipe by ID, scoped to its owner. Recipes of other users are not returned.
pub async fn get_recipe(conn: &mut DbConn, user_id: Uuid, id: i64) -> Result<Option<RecipeRow>> {
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1 AND r.user_id = $2");
    let recipe = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(recipe)
}

/// Lists the owner's recipes, newest ID first.
///
/// Each present ID filter keeps recipes linked to at least one of the IDs;
/// both filters must hold when both are given. EXISTS subqueries keep each
/// recipe once however many links match.
pub async fn list_recipes(conn: &mut DbConn, user_id: Uuid, filter: &RecipeFilter) -> Result<Vec<RecipeRow>> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.user_id = "));
    builder.push_bind(user_id);

    let filters = [
        (LabelKind::Tag, filter.tag_ids.as_deref()),
        (LabelKind::Ingredient, filter.ingredient_ids.as_deref()),
    ];
    for (kind, ids) in filters {
        let Some(ids) = ids else { continue };
        if ids.is_empty() {
            continue;
        }

        builder.push(format!(
            " AND EXISTS (SELECT 1 FROM {} x WHERE x.recipe_id = r.id AND x.{} IN (",
            kind.link_table(),
            kind.link_column()
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated("))");
    }

    builder.push(" ORDER BY r.id DESC");

    let recipes = builder
        .build_query_as::<RecipeRow>()
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(recipes)
}

/// Writes the scalar fields of an owned recipe. Returns `None` when not found for this owner.
pub async fn update_recipe(conn: &mut DbConn, user_id: Uuid, id: i64, fields: &RecipeFields) -> Result<Option<RecipeRow>> {
    let recipe = sqlx::query_as::<_, RecipeRow>(
        r#"
        UPDATE recipes
        SET title = $1, time_minutes = $2, price_cents = $3, description = $4, link = $5, updated_at = $6
        WHERE id = $7 AND user_id = $8
        RETURNING id, user_id, title, time_minutes, price_cents, description, link, image, created_at, updated_at
        "#,
    )
    .bind(&fields.title)
    .bind(fields.time_minutes)
    .bind(fields.price)
    .bind(&fields.description)
    .bind(&fields.link)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(recipe)
}

/// Points the recipe at a new image path (or clears it).
pub async fn set_recipe_image(conn: &mut DbConn, user_id: Uuid, id: i64, image: Option<&str>) -> Result<Option<RecipeRow>> {
    let recipe = sqlx::query_as::<_, RecipeRow>(
        r#"
        UPDATE recipes
        SET image = $1, updated_at = $2
        WHERE id = $3 AND user_id = $4
        RETURNING id, user_id, title, time_minutes, price_cents, description, link, image, created_at, updated_at
        "#,
    )
    .bind(image)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(recipe)
}

/// Deletes an owned recipe. Tag and ingredient links cascade.
pub async fn delete_recipe(conn: &mut DbConn, user_id: Uuid, id: i64) -> Result<u64> {
    let rows_affected = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await
        .map_err(Error::Sqlx)?
        .rows_affected();

    Ok(rows_affected)
}
