pub mod mock_replicate;

use std::sync::Arc;

use crate::config::{ApiConfig, Config, LoggingConfig, ReplicateConfig};
use crate::replicate::ReplicateClient;
use crate::AppState;

/// Config pointing at a mock prediction API.
///
/// `token_env` names the variable the process-wide token is read from; tests
/// use distinct names so they can run in parallel.
pub fn test_config(base_url: &str, token_env: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        replicate: ReplicateConfig {
            base_url: base_url.to_string(),
            user_agent: "llama-chat".to_string(),
            token_env: token_env.to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

pub fn create_test_state(base_url: &str, token_env: &str) -> Arc<AppState> {
    let config = test_config(base_url, token_env);
    let backend = Arc::new(ReplicateClient::new(
        &config.replicate.base_url,
        &config.replicate.user_agent,
    ));
    Arc::new(AppState::new(config, backend))
}
