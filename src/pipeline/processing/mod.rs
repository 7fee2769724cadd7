// Pipeline processing: normalization, validation, derivation and batch assembly

pub mod aggregate;
pub mod batch;
pub mod net_fee;
pub mod normalize;
pub mod validate;

pub use batch::{BatchAssembler, BatchResult, IdGenerator, RandomIds, RowOutcome};
