use sea_orm::entity::prelude::*;

/// Category ids come from partner feeds, so they are not generated here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
    #[sea_orm(has_many = "super::shop_categories::Entity")]
    ShopCategories,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::shops::Entity> for Entity {
    fn to() -> RelationDef {
        super::shop_categories::Relation::Shops.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::shop_categories::Relation::Categories.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
