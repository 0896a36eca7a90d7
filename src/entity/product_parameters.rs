use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_parameters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_info_id: i32,
    pub parameter_id: i32,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_infos::Entity",
        from = "Column::ProductInfoId",
        to = "super::product_infos::Column::Id",
        on_delete = "Cascade"
    )]
    ProductInfos,
    #[sea_orm(
        belongs_to = "super::parameters::Entity",
        from = "Column::ParameterId",
        to = "super::parameters::Column::Id",
        on_delete = "Cascade"
    )]
    Parameters,
}

impl Related<super::product_infos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductInfos.def()
    }
}

impl Related<super::parameters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parameters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
