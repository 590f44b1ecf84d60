use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "planning_searches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub filter_key: String,
    pub filter_type: String,
    #[sea_orm(column_type = "Text")]
    pub results_json: String,
    pub created_at: String, // RFC 3339, fixed micro precision so it sorts as text
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
