use std::sync::Arc;

use windcube_reader::WindCubeSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<WindCubeSource>,
}

impl AppState {
    pub fn new(source: WindCubeSource) -> Self {
        Self {
            source: Arc::new(source),
        }
    }
}
