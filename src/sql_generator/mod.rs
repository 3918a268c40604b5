pub mod assembler;
pub mod context;
pub mod dialect;
pub mod errors;
pub mod filter;
pub mod operator;
pub mod params;
pub mod signature;
pub mod template_cache;
pub mod value;

pub use assembler::{PreparedQuery, QueryAssembler, VALUES_PARAM};
pub use context::SqlContext;
pub use dialect::{DialectKind, PagingStrategy};
pub use errors::SqlGenError;
pub use filter::{parse_scalar, significant_filters, FilterCriterion, PageSpec, SortDirection};
pub use operator::SqlOperator;
pub use params::{ParameterSet, SqlTemplate};
pub use signature::{QueryKind, StructuralSignature};
pub use template_cache::{CacheMetrics, CacheProvider, TemplateCache, TemplateCacheConfig};
pub use value::SqlValue;
