//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod flash_message;
pub mod price_change;
pub mod product;
pub mod sale;
pub mod sale_line;
pub mod session;
pub mod till_event;
pub mod user;

// Re-export specific types to avoid conflicts
pub use flash_message::{Entity as FlashMessage, Model as FlashMessageModel};
pub use price_change::{Entity as PriceChange, Model as PriceChangeModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use sale::{Entity as Sale, Model as SaleModel, SaleStatus};
pub use sale_line::{Entity as SaleLine, Model as SaleLineModel};
pub use session::{Entity as Session, Model as SessionModel};
pub use till_event::{Entity as TillEvent, Model as TillEventModel, TillEventKind};
pub use user::{Entity as User, Model as UserModel, Role};
