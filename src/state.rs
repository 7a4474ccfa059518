use crate::config::Config;
use crate::db::Store;
use crate::utils::flash::FlashKey;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub flash_key: FlashKey,
}

impl AppState {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            flash_key: FlashKey::new(&config.secret_key),
        }
    }
}
