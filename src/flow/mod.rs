pub mod conversion;
pub mod definition;
pub mod document;
pub mod service;

pub use conversion::*;
pub use definition::*;
pub use document::*;
pub use service::*;
