pub mod providers;
pub mod query_controller;
pub mod recommendations;
pub mod search_gateway;
pub mod selection;

pub use query_controller::{QueryController, QueryPhase, QuerySnapshot};
pub use recommendations::RecommendationFetcher;
pub use search_gateway::SearchGateway;
pub use selection::SelectionSet;
