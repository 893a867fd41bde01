pub mod flow;
pub mod types;

pub use flow::{Loadable, MenuFlow, MenuState};
pub use types::{MenuCategory, MenuItem, MenuItemDetail, NutritionalInfo};
