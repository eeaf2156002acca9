use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two kinds of per-user label a recipe can carry.
///
/// Tags and ingredients share shape and behaviour but live in separate
/// tables with their own recipe link tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Tag,
    Ingredient,
}

impl LabelKind {
    pub fn table(self) -> &'static str {
        match self {
            LabelKind::Tag => "tags",
            LabelKind::Ingredient => "ingredients",
        }
    }

    /// Join table linking recipes to this kind.
    pub fn link_table(self) -> &'static str {
        match self {
            LabelKind::Tag => "recipe_tags",
            LabelKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Column of the join table that references this kind.
    pub fn link_column(self) -> &'static str {
        match self {
            LabelKind::Tag => "tag_id",
            LabelKind::Ingredient => "ingredient_id",
        }
    }

    /// Singular name used in JSON envelopes and messages.
    pub fn singular(self) -> &'static str {
        match self {
            LabelKind::Tag => "tag",
            LabelKind::Ingredient => "ingredient",
        }
    }

    /// Plural name used in JSON envelopes and payload keys.
    pub fn plural(self) -> &'static str {
        self.table()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LabelKind::Tag => "Tag",
            LabelKind::Ingredient => "Ingredient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
}

/// A label name inside a recipe payload: `{"name": "Vegan"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelName {
    pub name: String,
}

/// Create or replace payload for a label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelPayload {
    #[serde(default)]
    pub name: Option<String>,
}

/// Label list filter: `?assigned_only=1`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelFilterParams {
    pub assigned_only: Option<String>,
}

/// A label attached to a recipe, as returned by the bulk link lookup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeLabel {
    pub recipe_id: i64,
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
}

impl From<RecipeLabel> for Label {
    fn from(row: RecipeLabel) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
        }
    }
}
