pub mod api_client;
pub mod config_service;
pub mod paths;
pub mod pkce;
pub mod supabase_gateway;

pub use crate::api_client::RestApiClient;
pub use crate::config_service::ConfigService;
pub use crate::supabase_gateway::SupabaseSessionGateway;
