//! Builds ingest definitions from scenes and persists them.

use std::sync::Arc;

use regex_lite::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use super::datasource::{DatasourceConfig, DatasourceKind};
use super::error::DefinitionError;
use super::types::{BandMapping, IngestDefinition, IngestLayer, OutputDefinition, SourceDefinition};
use crate::scene::Scene;
use crate::storage::{BlobStore, StorageConfig};

/// Landsat 8 Collection 1 product id, capturing WRS path and row.
const LANDSAT_PRODUCT_ID: &str = r"^L[COT]08_L1[A-Z]{2}_(\d{3})(\d{3})_\d{8}_\d{8}_\d{2}_[A-Z0-9]{2}$";

/// Landsat 8 OLI/TIRS bands shipped per product.
const LANDSAT_BAND_COUNT: u32 = 11;

/// Sentinel-2 band file suffix, capturing the band name.
const SENTINEL2_BAND_FILE: &str = r"(?i)(B(?:0[1-9]|1[0-2]|8A))\.jp2$";

/// Sentinel-2 bands in output order.
const SENTINEL2_BAND_ORDER: [&str; 13] = [
    "B01", "B02", "B03", "B04", "B05", "B06", "B07", "B08", "B8A", "B09", "B10", "B11", "B12",
];

const OUTPUT_CRS: &str = "epsg:3857";
const OUTPUT_CELL_TYPE: &str = "uint16raw";

/// Builds an [`IngestDefinition`] for a scene and persists it to blob storage.
pub struct JobDefinitionBuilder {
    blobs: Arc<dyn BlobStore>,
    storage: StorageConfig,
    datasources: DatasourceConfig,
    output_location: String,
}

impl JobDefinitionBuilder {
    /// `output_location` is the layer URI written into every definition.
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        storage: StorageConfig,
        datasources: DatasourceConfig,
        output_location: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            storage,
            datasources,
            output_location: output_location.into(),
        }
    }

    /// Strategy that will be used for `scene`.
    pub fn kind_for(&self, scene: &Scene) -> DatasourceKind {
        DatasourceKind::classify(&scene.datasource, &self.datasources)
    }

    /// Builds a definition with a fresh id. Does not touch storage.
    pub fn build(&self, scene: &Scene) -> Result<IngestDefinition, DefinitionError> {
        if scene.owner.trim().is_empty() {
            return Err(DefinitionError::validation(&scene.id, "scene has no owner"));
        }
        if scene.datasource.trim().is_empty() {
            return Err(DefinitionError::validation(
                &scene.id,
                "scene has no datasource",
            ));
        }

        let kind = self.kind_for(scene);
        let sources = match kind {
            DatasourceKind::Landsat8 => self.landsat8_sources(scene)?,
            DatasourceKind::Sentinel2 => sentinel2_sources(scene)?,
            DatasourceKind::Generic => generic_sources(scene)?,
        };

        let definition = IngestDefinition {
            id: Uuid::new_v4().to_string(),
            uri: None,
            scene_id: scene.id.clone(),
            layers: vec![IngestLayer {
                id: scene.id.clone(),
                output: OutputDefinition {
                    uri: self.output_location.clone(),
                    crs: OUTPUT_CRS.to_string(),
                    cell_type: OUTPUT_CELL_TYPE.to_string(),
                    pyramid: true,
                    native: true,
                },
                sources,
            }],
        };

        debug!(
            scene_id = %scene.id,
            definition_id = %definition.id,
            strategy = kind.as_str(),
            "Built ingest definition"
        );
        Ok(definition)
    }

    /// Writes `definition` to its deterministic key and records the URI.
    pub async fn persist(
        &self,
        definition: &IngestDefinition,
    ) -> Result<IngestDefinition, DefinitionError> {
        let key = self.storage.definition_key(&definition.id);
        let bytes = serde_json::to_vec(definition)
            .map_err(|e| DefinitionError::Serialization(e.to_string()))?;
        let uri = self.blobs.put(&key, bytes).await?;

        info!(definition_id = %definition.id, uri = %uri, "Persisted ingest definition");
        Ok(IngestDefinition {
            uri: Some(uri),
            ..definition.clone()
        })
    }

    fn landsat8_sources(&self, scene: &Scene) -> Result<Vec<SourceDefinition>, DefinitionError> {
        if scene.name.trim().is_empty() {
            return Err(DefinitionError::validation(
                &scene.id,
                "Landsat 8 scene has no product id",
            ));
        }

        let re = Regex::new(LANDSAT_PRODUCT_ID)
            .map_err(|e| DefinitionError::validation(&scene.id, e.to_string()))?;
        let caps = re.captures(&scene.name).ok_or_else(|| {
            DefinitionError::validation(
                &scene.id,
                format!("'{}' is not a Landsat 8 Collection 1 product id", scene.name),
            )
        })?;
        let (path, row) = (&caps[1], &caps[2]);

        let root = self.datasources.landsat_root.trim_end_matches('/');
        Ok((1..=LANDSAT_BAND_COUNT)
            .map(|band| {
                SourceDefinition::single_band(
                    format!(
                        "{root}/{path}/{row}/{name}/{name}_B{band}.TIF",
                        name = scene.name
                    ),
                    band - 1,
                )
            })
            .collect())
    }
}

fn sentinel2_sources(scene: &Scene) -> Result<Vec<SourceDefinition>, DefinitionError> {
    if scene.images.is_empty() {
        return Err(DefinitionError::validation(
            &scene.id,
            "Sentinel-2 scene has no images",
        ));
    }

    let re = Regex::new(SENTINEL2_BAND_FILE)
        .map_err(|e| DefinitionError::validation(&scene.id, e.to_string()))?;

    let mut bands = Vec::with_capacity(scene.images.len());
    for image in &scene.images {
        let band = re
            .captures(&image.source_uri)
            .map(|caps| caps[1].to_ascii_uppercase())
            .and_then(|name| SENTINEL2_BAND_ORDER.iter().position(|b| *b == name))
            .ok_or_else(|| {
                DefinitionError::validation(
                    &scene.id,
                    format!("'{}' is not a Sentinel-2 band file", image.source_uri),
                )
            })?;
        bands.push((band, image.source_uri.as_str()));
    }
    bands.sort_by_key(|(order, _)| *order);

    Ok(bands
        .into_iter()
        .enumerate()
        .map(|(target, (_, uri))| SourceDefinition::single_band(uri, target as u32))
        .collect())
}

fn generic_sources(scene: &Scene) -> Result<Vec<SourceDefinition>, DefinitionError> {
    if scene.images.is_empty() {
        return Err(DefinitionError::validation(&scene.id, "scene has no images"));
    }

    let mut target = 0;
    let mut sources = Vec::with_capacity(scene.images.len());
    for image in &scene.images {
        if image.bands.is_empty() {
            return Err(DefinitionError::validation(
                &scene.id,
                format!("image {} has no bands", image.source_uri),
            ));
        }

        let mut band_maps = Vec::with_capacity(image.bands.len());
        for band in &image.bands {
            if band.number == 0 {
                return Err(DefinitionError::validation(
                    &scene.id,
                    format!("band '{}' of {} has number 0", band.name, image.source_uri),
                ));
            }
            band_maps.push(BandMapping {
                source: band.number - 1,
                target,
            });
            target += 1;
        }

        sources.push(SourceDefinition {
            uri: image.source_uri.clone(),
            band_maps,
        });
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{LANDSAT8_DATASOURCE_ID, SENTINEL2_DATASOURCE_IDS};
    use crate::scene::{Band, SceneImage};
    use crate::storage::ObjectBlobStore;

    const LANDSAT_NAME: &str = "LC08_L1TP_139045_20170304_20170316_01_T1";

    fn builder() -> (JobDefinitionBuilder, Arc<dyn BlobStore>) {
        let blobs: Arc<dyn BlobStore> = Arc::new(ObjectBlobStore::in_memory("rf-data"));
        (
            JobDefinitionBuilder::new(
                Arc::clone(&blobs),
                StorageConfig::default(),
                DatasourceConfig::default(),
                "s3://tiles/layers",
            ),
            blobs,
        )
    }

    fn image(uri: &str, bands: &[u32]) -> SceneImage {
        SceneImage {
            source_uri: uri.to_string(),
            bands: bands
                .iter()
                .map(|n| Band {
                    name: format!("band {}", n),
                    number: *n,
                })
                .collect(),
        }
    }

    #[test]
    fn test_landsat_strategy() {
        let (builder, _) = builder();
        let scene = Scene::new("s1", "owner", LANDSAT8_DATASOURCE_ID).with_name(LANDSAT_NAME);

        let definition = builder.build(&scene).unwrap();
        let sources = &definition.layers[0].sources;
        assert_eq!(sources.len(), 11);
        assert_eq!(
            sources[0].uri,
            format!(
                "s3://landsat-pds/c1/L8/139/045/{0}/{0}_B1.TIF",
                LANDSAT_NAME
            )
        );
        assert_eq!(definition.targets(), (0..11).collect::<Vec<u32>>());
        assert_eq!(definition.layers[0].output.uri, "s3://tiles/layers");
    }

    #[test]
    fn test_landsat_rejects_bad_product_id() {
        let (builder, _) = builder();
        let scene = Scene::new("s1", "owner", LANDSAT8_DATASOURCE_ID).with_name("not-a-product");
        assert!(matches!(
            builder.build(&scene),
            Err(DefinitionError::Validation { .. })
        ));

        let unnamed = Scene::new("s2", "owner", LANDSAT8_DATASOURCE_ID);
        assert!(matches!(
            builder.build(&unnamed),
            Err(DefinitionError::Validation { .. })
        ));
    }

    #[test]
    fn test_sentinel_strategy_orders_bands() {
        let (builder, _) = builder();
        let scene = Scene::new("s1", "owner", SENTINEL2_DATASOURCE_IDS[1])
            .with_image(image("s3://s2/tiles/37/M/BP/B8A.jp2", &[]))
            .with_image(image("s3://s2/tiles/37/M/BP/B02.jp2", &[]))
            .with_image(image("s3://s2/tiles/37/M/BP/B12.jp2", &[]));

        let definition = builder.build(&scene).unwrap();
        let uris: Vec<&str> = definition.layers[0]
            .sources
            .iter()
            .map(|s| s.uri.as_str())
            .collect();
        assert_eq!(
            uris,
            vec![
                "s3://s2/tiles/37/M/BP/B02.jp2",
                "s3://s2/tiles/37/M/BP/B8A.jp2",
                "s3://s2/tiles/37/M/BP/B12.jp2",
            ]
        );
        assert_eq!(definition.targets(), vec![0, 1, 2]);
    }

    #[test]
    fn test_sentinel_rejects_non_band_file() {
        let (builder, _) = builder();
        let scene = Scene::new("s1", "owner", SENTINEL2_DATASOURCE_IDS[0])
            .with_image(image("s3://s2/preview.jpg", &[]));
        assert!(matches!(
            builder.build(&scene),
            Err(DefinitionError::Validation { .. })
        ));
    }

    #[test]
    fn test_generic_strategy_maps_consecutive_targets() {
        let (builder, _) = builder();
        let scene = Scene::new("s1", "owner", "generic-ds")
            .with_image(image("s3://up/a.tif", &[1, 2, 3]))
            .with_image(image("s3://up/b.tif", &[2]));

        let definition = builder.build(&scene).unwrap();
        let sources = &definition.layers[0].sources;
        assert_eq!(sources.len(), 2);
        assert_eq!(
            sources[1].band_maps,
            vec![BandMapping {
                source: 1,
                target: 3
            }]
        );
        assert_eq!(definition.targets(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let (builder, _) = builder();

        let no_owner = Scene::new("s1", "", "generic-ds").with_image(image("s3://a.tif", &[1]));
        assert!(matches!(
            builder.build(&no_owner),
            Err(DefinitionError::Validation { .. })
        ));

        let no_images = Scene::new("s2", "owner", "generic-ds");
        assert!(matches!(
            builder.build(&no_images),
            Err(DefinitionError::Validation { .. })
        ));

        let no_bands = Scene::new("s3", "owner", "generic-ds").with_image(image("s3://a.tif", &[]));
        assert!(matches!(
            builder.build(&no_bands),
            Err(DefinitionError::Validation { .. })
        ));
    }

    #[test]
    fn test_each_build_gets_fresh_id() {
        let (builder, _) = builder();
        let scene = Scene::new("s1", "owner", "generic-ds").with_image(image("s3://a.tif", &[1]));
        let a = builder.build(&scene).unwrap();
        let b = builder.build(&scene).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_persist_at_deterministic_key() {
        let (builder, blobs) = builder();
        let scene = Scene::new("s1", "owner", "generic-ds").with_image(image("s3://a.tif", &[1]));

        let built = builder.build(&scene).unwrap();
        let definition = builder.persist(&built).await.unwrap();
        let key = format!("ingest-definitions/{}.json", definition.id);
        assert_eq!(
            definition.uri.as_deref(),
            Some(format!("memory://rf-data/{}", key).as_str())
        );

        let stored: IngestDefinition =
            serde_json::from_slice(&blobs.get(&key).await.unwrap()).unwrap();
        assert_eq!(stored.scene_id, "s1");
        assert_eq!(stored.id, definition.id);
    }
}
