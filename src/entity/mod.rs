pub mod audit_logs;
pub mod categories;
pub mod confirm_email_tokens;
pub mod contacts;
pub mod order_items;
pub mod orders;
pub mod parameters;
pub mod password_reset_tokens;
pub mod product_infos;
pub mod product_parameters;
pub mod products;
pub mod shop_categories;
pub mod shops;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use confirm_email_tokens::Entity as ConfirmEmailTokens;
pub use contacts::Entity as Contacts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use parameters::Entity as Parameters;
pub use password_reset_tokens::Entity as PasswordResetTokens;
pub use product_infos::Entity as ProductInfos;
pub use product_parameters::Entity as ProductParameters;
pub use products::Entity as Products;
pub use shop_categories::Entity as ShopCategories;
pub use shops::Entity as Shops;
pub use users::Entity as Users;
