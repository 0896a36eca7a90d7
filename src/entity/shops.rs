use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub url: Option<String>,
    #[sea_orm(unique)]
    pub user_id: Option<i32>,
    /// Whether the shop currently accepts orders.
    pub state: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::product_infos::Entity")]
    ProductInfos,
    #[sea_orm(has_many = "super::shop_categories::Entity")]
    ShopCategories,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::product_infos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductInfos.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::shop_categories::Relation::Categories.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::shop_categories::Relation::Shops.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
