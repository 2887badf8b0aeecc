pub mod aggregate;
pub mod document;
pub mod line;
pub mod product;
pub mod receipt;
pub mod status;

pub use aggregate::OrderAggregate;
pub use document::{BackendReply, DocumentHeader, DocumentId, DocumentPayload, SubmitOutcome};
pub use line::{DetailLine, LineCandidate};
pub use product::{CustomerItem, Keyed, ProductItem, SearchPage};
pub use receipt::{CollectionLine, ReceiptFooter};
pub use status::{DocumentType, EcfStatus, StatusStyle};
