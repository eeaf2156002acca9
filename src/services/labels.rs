//! Tag and ingredient management.
//!
//! Both label kinds go through the same functions; `LabelKind` selects the
//! table. Every lookup is scoped to the caller, so labels of other users
//! behave as if they did not exist.

use uuid::Uuid;

use crate::DbConn;
use crate::{
    error::{Error, Result},
    models::labels::{Label, LabelFilterParams, LabelKind, LabelName, LabelPayload},
    queries::labels,
    validation::{parse_flag, validate_required_text},
};

fn not_found(kind: LabelKind, id: i64) -> Error {
    Error::NotFound(format!("{} with ID {} not found", kind.display_name(), id))
}

fn required_name(payload: &LabelPayload) -> Result<String> {
    match &payload.name {
        Some(name) => validate_required_text(name, "name"),
        None => Err(Error::invalid("name", "This field is required.")),
    }
}

/// Creates a label owned by the caller.
pub async fn create_label(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, payload: LabelPayload) -> Result<Label> {
    let name = required_name(&payload)?;
    let label = labels::create_label(conn, kind, user_id, &name).await?;

    tracing::info!(operation = "create_label", kind = kind.singular(), label_id = label.id, "Label created");
    Ok(label)
}

/// Lists the caller's labels, optionally only those assigned to a recipe.
pub async fn list_labels(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, params: &LabelFilterParams) -> Result<Vec<Label>> {
    let assigned_only = match params.assigned_only.as_deref() {
        Some(value) => parse_flag(value, "assigned_only")?,
        None => false,
    };

    labels::list_labels(conn, kind, user_id, assigned_only).await
}

/// Renames one of the caller's labels.
///
/// A full update requires `name`; a partial update without it leaves the
/// label unchanged.
pub async fn update_label(
    conn: &mut DbConn,
    kind: LabelKind,
    user_id: Uuid,
    id: i64,
    payload: LabelPayload,
    require_all: bool,
) -> Result<Label> {
    if payload.name.is_none() && !require_all {
        return labels::get_label(conn, kind, user_id, id)
            .await?
            .ok_or_else(|| not_found(kind, id));
    }

    let name = required_name(&payload)?;
    let label = labels::update_label(conn, kind, user_id, id, &name)
        .await?
        .ok_or_else(|| not_found(kind, id))?;

    tracing::info!(operation = "update_label", kind = kind.singular(), label_id = label.id, "Label updated");
    Ok(label)
}

/// Deletes one of the caller's labels, detaching it from every recipe.
pub async fn delete_label(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, id: i64) -> Result<()> {
    let rows_affected = labels::delete_label(conn, kind, user_id, id).await?;
    if rows_affected == 0 {
        return Err(not_found(kind, id));
    }

    tracing::info!(operation = "delete_label", kind = kind.singular(), label_id = id, "Label deleted");
    Ok(())
}

/// Checks the names in a nested label list and returns them trimmed.
///
/// Errors are reported against the payload key, e.g. `tags`.
pub fn validate_label_names(kind: LabelKind, names: &[LabelName]) -> Result<Vec<String>> {
    names
        .iter()
        .map(|label| {
            validate_required_text(&label.name, "name").map_err(|e| match e {
                Error::Validation(v) => Error::invalid(
                    kind.plural(),
                    v.message_for("name").unwrap_or("Invalid name.").to_string(),
                ),
                other => other,
            })
        })
        .collect()
}

/// Resolves names to the caller's labels, creating the missing ones.
///
/// Existing labels are matched by exact name. Repeated names resolve to the
/// same label, so the returned IDs are unique and keep first-seen order.
pub async fn get_or_create_labels(conn: &mut DbConn, kind: LabelKind, user_id: Uuid, names: &[String]) -> Result<Vec<i64>> {
    let mut ids: Vec<i64> = Vec::with_capacity(names.len());

    for name in names {
        let label = match labels::find_label_by_name(conn, kind, user_id, name).await? {
            Some(existing) => existing,
            None => {
                let created = labels::create_label(conn, kind, user_id, name).await?;
                tracing::debug!(
                    operation = "get_or_create_labels",
                    kind = kind.singular(),
                    label_id = created.id,
                    "Label created during recipe write"
                );
                created
            }
        };

        if !ids.contains(&label.id) {
            ids.push(label.id);
        }
    }

    Ok(ids)
}
