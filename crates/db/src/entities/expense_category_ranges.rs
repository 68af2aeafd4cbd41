//! `SeaORM` Entity for expense_category_ranges table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_category_ranges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_category_id: Uuid,
    pub range_low: i64,
    pub range_high: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expense_categories::Entity",
        from = "Column::ExpenseCategoryId",
        to = "super::expense_categories::Column::Id"
    )]
    ExpenseCategories,
}

impl Related<super::expense_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
