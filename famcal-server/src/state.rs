//! Shared application state.

use std::sync::Arc;

use famcal_core::FamcalResult;

use crate::auth::AuthClient;
use crate::config::Config;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: AuthClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> FamcalResult<Self> {
        let store = Store::open(&config.database_path)?;
        let auth = AuthClient::new(&config.auth);
        Ok(AppState {
            store,
            auth,
            config: Arc::new(config),
        })
    }
}
