// Entity Models
//
// Collectibles: nine identically-shaped categories, one table each.
// Invoices / customers / users: the conventional demonstration schema.

pub mod collectible;
pub mod customer;
pub mod invoice;
pub mod user;

pub use collectible::{
    format_percentage, Category, Collectible, CollectibleCounts, CollectibleStatus, NewCollectible,
};
pub use customer::{Customer, CustomerField, CustomersTableRow};
pub use invoice::{
    format_currency, CardData, InvoiceForm, InvoiceStatus, InvoicesTableRow,
    LatestInvoice, NewInvoice, Revenue,
};
pub use user::{Session, User};
