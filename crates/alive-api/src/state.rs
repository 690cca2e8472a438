use std::sync::Arc;

use alive_core::accounts::Accounts;
use alive_core::fanout::FanoutEngine;
use alive_db::SharedStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: SharedStore,
    pub accounts: Accounts,
    pub fanout: Arc<FanoutEngine>,
}

impl AppStateInner {
    pub fn new(store: SharedStore, jwt_secret: impl Into<String>, fanout: Arc<FanoutEngine>) -> AppState {
        Arc::new(Self {
            accounts: Accounts::new(store.clone(), jwt_secret),
            store,
            fanout,
        })
    }
}
