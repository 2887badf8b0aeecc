pub mod export;
pub mod lookup;
pub mod persistence;

pub use export::export_lines_csv;
pub use lookup::{LookupService, PgCustomerLookup, PgProductLookup, RestLookup};
pub use persistence::{PersistenceAdapter, PgPersistence, RestPersistence};
