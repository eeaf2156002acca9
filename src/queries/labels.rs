use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::labels::{Label, LabelKind, RecipeLabel},
};

use crate::DbConn;

/// Creates a new label of `kind` owned by `user_id`.
pub async fn create_label(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, name: &str) -> Result<Label> {
    let sql = format!(
        "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
        kind.table()
    );

    let label = sqlx::query_as::<_, Label>(&sql)
        .bind(user_id)
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(label)
}

/// Gets a label by ID, scoped to its owner. Labels of other users are not returned.
pub async fn get_label(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, id: i64) -> Result<Option<Label>> {
    let sql = format!(
        "SELECT id, user_id, name FROM {} WHERE id = $1 AND user_id = $2",
        kind.table()
    );

    let label = sqlx::query_as::<_, Label>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(label)
}

/// Finds the owner's label with exactly this name (case-sensitive).
///
/// Names are not unique; the oldest match wins.
pub async fn find_label_by_name(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, name: &str) -> Result<Option<Label>> {
    let sql = format!(
        "SELECT id, user_id, name FROM {} WHERE user_id = $1 AND name = $2 ORDER BY id LIMIT 1",
        kind.table()
    );

    let label = sqlx::query_as::<_, Label>(&sql)
        .bind(user_id)
        .bind(name)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(label)
}

/// Lists the owner's labels ordered by descending name.
///
/// With `assigned_only`, only labels linked to at least one recipe are returned.
pub async fn list_labels(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, assigned_only: bool) -> Result<Vec<Label>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT l.id, l.user_id, l.name FROM {} l WHERE l.user_id = ",
        kind.table()
    ));
    builder.push_bind(user_id);

    if assigned_only {
        // EXISTS keeps each label once regardless of how many recipes use it
        builder.push(format!(
            " AND EXISTS (SELECT 1 FROM {} x WHERE x.{} = l.id)",
            kind.link_table(),
            kind.link_column()
        ));
    }

    builder.push(" ORDER BY l.name DESC, l.id DESC");

    let labels = builder
        .build_query_as::<Label>()
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(labels)
}

/// Renames a label. Returns `None` when the label does not exist for this owner.
pub async fn update_label(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, id: i64, name: &str) -> Result<Option<Label>> {
    let sql = format!(
        "UPDATE {} SET name = $1 WHERE id = $2 AND user_id = $3 RETURNING id, user_id, name",
        kind.table()
    );

    let label = sqlx::query_as::<_, Label>(&sql)
        .bind(name)
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(label)
}

/// Deletes a label by ID, scoped to its owner. Recipe links cascade.
pub async fn delete_label(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, id: i64) -> Result<u64> {
    let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", kind.table());

    let rows_affected = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await
        .map_err(Error::Sqlx)?
        .rows_affected();

    Ok(rows_affected)
}

/// Replaces the recipe's links of `kind` with `label_ids`.
pub async fn set_recipe_labels(conn: &mut DbConn, kind: LabelKind, recipe_id: i64, label_ids: &[i64]) -> Result<()> {
    let delete_sql = format!("DELETE FROM {} WHERE recipe_id = $1", kind.link_table());
    sqlx::query(&delete_sql)
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(Error::Sqlx)?;

    if label_ids.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "INSERT OR IGNORE INTO {} (recipe_id, {}) ",
        kind.link_table(),
        kind.link_column()
    ));
    builder.push_values(label_ids, |mut b, label_id| {
        b.push_bind(recipe_id).push_bind(*label_id);
    });

    builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(())
}

/// Loads the labels of `kind` attached to each of `recipe_ids`, ordered by label ID.
pub async fn labels_for_recipes(conn: &mut DbConn, kind: LabelKind, recipe_ids: &[i64]) -> Result<Vec<RecipeLabel>> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT x.recipe_id, l.id, l.user_id, l.name FROM {} x JOIN {} l ON l.id = x.{} WHERE x.recipe_id IN (",
        kind.link_table(),
        kind.table(),
        kind.link_column()
    ));
    let mut separated = builder.separated(", ");
    for recipe_id in recipe_ids {
        separated.push_bind(*recipe_id);
    }
    separated.push_unseparated(") ORDER BY x.recipe_id, l.id");

    let rows = builder
        .build_query_as::<RecipeLabel>()
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(rows)
}
