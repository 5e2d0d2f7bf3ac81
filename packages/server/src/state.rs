use crate::config::AppConfig;
use crate::service::CarService;
use crate::storage::StorageContext;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub cars: CarService,
}

impl AppState {
    pub fn new(config: AppConfig, storage: &StorageContext) -> Self {
        Self {
            config,
            cars: CarService::new(storage),
        }
    }
}
