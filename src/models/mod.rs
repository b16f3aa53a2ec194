pub mod product;
pub mod recommendation;

pub use product::{ParsedDocument, ProductRecord, UNKNOWN_PRODUCT_NAME};
pub use recommendation::{
    RecommendationQuery, RecommendationResponse, RecommendationState, RecommendedItem,
};
