//! `SeaORM` Entity for expense_categories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_category_ranges::Entity")]
    ExpenseCategoryRanges,
}

impl Related<super::expense_category_ranges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseCategoryRanges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
