pub mod registry;
pub mod search;
pub mod session;

pub use registry::{SessionHandle, SessionRegistry};
pub use search::LatestSearch;
pub use session::{EditMode, EditorSession};
