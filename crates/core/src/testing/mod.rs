//! Testing utilities and mock implementations.
//!
//! Mocks for every collaborator the orchestrator talks to, so a full ingest
//! runs without S3, EMR, Spark or the batch JAR.
//!
//! # Example
//!
//! ```rust,ignore
//! use rf_ingest_core::testing::{fixtures, MockBlobStore, MockClusterApi, MockLocalExecutor};
//!
//! let blobs = Arc::new(MockBlobStore::new());
//! let statuses = StatusStore::new(blobs.clone(), config.storage.clone());
//!
//! // The cluster "writes" an INGESTED record for every submitted step.
//! let cluster = Arc::new(MockClusterApi::new().writing_status(statuses));
//! cluster.set_step_states(vec![StepState::Running, StepState::Completed]).await;
//! ```

mod backend_report;
mod mock_blob_store;
mod mock_cluster_api;
mod mock_hooks;
mod mock_local_executor;

pub use mock_blob_store::{MockBlobStore, RecordedBlobOp};
pub use mock_cluster_api::MockClusterApi;
pub use mock_hooks::MockIngestHooks;
pub use mock_local_executor::MockLocalExecutor;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::Config;
    use crate::definition::{LANDSAT8_DATASOURCE_ID, SENTINEL2_DATASOURCE_IDS};
    use crate::scene::{Band, Scene, SceneImage};

    /// Datasource id that matches none of the configured strategies.
    pub const GENERIC_DATASOURCE_ID: &str = "0d2e3c28-5b1a-4d5e-9f2b-7c6a8e1f4b3d";

    /// A valid Landsat 8 Collection 1 product id (path 139, row 045).
    pub const LANDSAT_PRODUCT_ID: &str = "LC08_L1TP_139045_20170304_20170316_01_T1";

    /// Config that passes validation, with a test tile bucket.
    pub fn config() -> Config {
        let mut config = Config::default();
        config.output.tile_server_bucket = "test-tiles".to_string();
        config
    }

    /// A scene using the generic strategy with one three-band image.
    pub fn generic_scene(id: &str) -> Scene {
        Scene::new(id, "user-1", GENERIC_DATASOURCE_ID).with_image(SceneImage {
            source_uri: format!("s3://imagery/{}.tif", id),
            bands: vec![
                band("red", 1),
                band("green", 2),
                band("blue", 3),
            ],
        })
    }

    /// A Landsat 8 scene.
    pub fn landsat_scene(id: &str) -> Scene {
        Scene::new(id, "user-1", LANDSAT8_DATASOURCE_ID).with_name(LANDSAT_PRODUCT_ID)
    }

    /// A Sentinel-2 scene with its visible bands listed out of order.
    pub fn sentinel_scene(id: &str) -> Scene {
        let prefix = "s3://sentinel-s2-l1c/tiles/36/R/UU/2017/3/4/0";
        ["B04", "B02", "B03"]
            .iter()
            .fold(
                Scene::new(id, "user-1", SENTINEL2_DATASOURCE_IDS[1]),
                |scene, b| {
                    scene.with_image(SceneImage {
                        source_uri: format!("{}/{}.jp2", prefix, b),
                        bands: vec![band(b, 1)],
                    })
                },
            )
    }

    pub fn band(name: &str, number: u32) -> Band {
        Band {
            name: name.to_string(),
            number,
        }
    }
}
