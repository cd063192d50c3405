use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use engine::resource_names::{parse_resource_name, ResourceNameError};
use engine::{
    AdvanceOutcome, ResourceError, ResourceManager, SpriteRenderer, TextureHandle, Vec2,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::definitions::{read_document, write_document, DefinitionsError, TrainDocument, TrainRecord};
use super::{SpawnTemplate, Train, TrainType};

const TRAIN_TEXTURE_DIR: &str = "images/trains";
const DEFAULT_TRAIN_TEXTURES: [&str; 2] = ["freight-greytrain.png", "freight-redtrain.png"];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrainHandlerConfig {
    pub(crate) definitions_path: PathBuf,
    pub(crate) texture_files: Vec<String>,
    pub(crate) spawn: SpawnTemplate,
}

impl TrainHandlerConfig {
    pub(crate) fn for_assets(assets_dir: &Path) -> Self {
        Self {
            definitions_path: assets_dir.join("gamedata").join("traindata.json"),
            ..Self::default()
        }
    }
}

impl Default for TrainHandlerConfig {
    fn default() -> Self {
        Self {
            definitions_path: PathBuf::from("assets/gamedata/traindata.json"),
            texture_files: DEFAULT_TRAIN_TEXTURES.iter().map(|file| file.to_string()).collect(),
            spawn: SpawnTemplate::default(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum RegistryError {
    #[error("a train named '{name}' already exists")]
    DuplicateName { name: String },
    #[error("no texture is registered for train name '{train_name}'")]
    UnknownTrainName { train_name: String },
    #[error("train texture '{file_name}' does not follow <type>-<name>.<ext>: {source}")]
    InvalidTextureName {
        file_name: String,
        #[source]
        source: ResourceNameError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LoadSummary {
    pub(crate) loaded: usize,
    pub(crate) skipped: usize,
}

#[derive(Debug, Clone, Copy)]
struct ServiceTexture {
    train_type: TrainType,
    texture: TextureHandle,
}

/// Name-keyed registry of live trains plus the definitions document they were built from.
///
/// The document is the persisted truth: records that cannot be turned into a live train (for
/// example because their texture is missing) stay in it so a later persist keeps them.
#[derive(Debug)]
pub(crate) struct TrainHandler {
    config: TrainHandlerConfig,
    services: BTreeMap<String, ServiceTexture>,
    trains: BTreeMap<String, Train>,
    document: TrainDocument,
}

impl TrainHandler {
    pub(crate) fn new(config: TrainHandlerConfig) -> Self {
        Self {
            config,
            services: BTreeMap::new(),
            trains: BTreeMap::new(),
            document: TrainDocument::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &TrainHandlerConfig {
        &self.config
    }

    /// Records `handle` under the identifier half of `file_name`. Returns the identifier.
    pub(crate) fn register_texture(
        &mut self,
        file_name: &str,
        handle: TextureHandle,
    ) -> Result<String, RegistryError> {
        let parsed =
            parse_resource_name(file_name).map_err(|source| RegistryError::InvalidTextureName {
                file_name: file_name.to_string(),
                source,
            })?;
        let train_type = TrainType::from_texture_prefix(&parsed.category);
        self.services.insert(
            parsed.identifier.clone(),
            ServiceTexture {
                train_type,
                texture: handle,
            },
        );
        debug!(
            file_name,
            train_name = parsed.identifier.as_str(),
            %train_type,
            "train_texture_registered"
        );
        Ok(parsed.identifier)
    }

    /// Loads every configured texture from `images/trains/`. Badly named files are skipped;
    /// a file that cannot be loaded aborts.
    pub(crate) fn load_textures(
        &mut self,
        resources: &mut ResourceManager,
    ) -> Result<usize, ResourceError> {
        let mut registered = 0;
        for file_name in self.config.texture_files.clone() {
            let identifier = match parse_resource_name(&file_name) {
                Ok(parsed) => parsed.identifier,
                Err(error) => {
                    warn!(file_name = file_name.as_str(), error = %error, "train_texture_name_invalid");
                    continue;
                }
            };
            let relative = Path::new(TRAIN_TEXTURE_DIR).join(&file_name);
            let texture_name = format!("trains/{identifier}");
            let handle = match resources.texture_handle(&texture_name) {
                Some(handle) => handle,
                None => resources.load_texture(&relative, &texture_name)?,
            };
            if self.register_texture(&file_name, handle).is_ok() {
                registered += 1;
            }
        }
        info!(registered, "train_textures_loaded");
        Ok(registered)
    }

    /// Creates a live train and appends its record to the document.
    pub(crate) fn add_train(
        &mut self,
        name: &str,
        train_name: &str,
        path: &[Vec2],
    ) -> Result<(), RegistryError> {
        if self.is_name_taken(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        let service = self.service(train_name)?;

        self.document.trains.push(TrainRecord {
            name: name.to_string(),
            train_name: train_name.to_string(),
            train_type: service.train_type,
            path: path.to_vec(),
        });
        self.spawn_train(name, train_name, service, path);
        info!(name, train_name, points = path.len(), "train_added");
        Ok(())
    }

    /// Adds another train of an existing service under the first free `<train_name>-<n>`.
    pub(crate) fn extend_service(
        &mut self,
        train_name: &str,
        path: &[Vec2],
    ) -> Result<String, RegistryError> {
        self.service(train_name)?;
        let name = (1..)
            .map(|n: u32| format!("{train_name}-{n}"))
            .find(|candidate| !self.is_name_taken(candidate))
            .unwrap_or_else(|| format!("{train_name}-{}", self.document.trains.len() + 1));
        self.add_train(&name, train_name, path)?;
        Ok(name)
    }

    /// Replaces the document and the live set with the contents of the definitions file.
    /// On error nothing changes.
    pub(crate) fn load_definitions(&mut self) -> Result<LoadSummary, DefinitionsError> {
        let path = self.config.definitions_path.clone();
        let document = match read_document(&path)? {
            Some(document) => document,
            None => {
                info!(path = %path.display(), "train_definitions_missing_starting_empty");
                TrainDocument::default()
            }
        };

        self.trains.clear();
        let mut summary = LoadSummary::default();
        for record in &document.trains {
            if self.trains.contains_key(&record.name) {
                warn!(name = record.name.as_str(), "train_definition_duplicate_skipped");
                summary.skipped += 1;
                continue;
            }
            let Ok(service) = self.service(&record.train_name) else {
                warn!(
                    name = record.name.as_str(),
                    train_name = record.train_name.as_str(),
                    "train_definition_unresolved_skipped"
                );
                summary.skipped += 1;
                continue;
            };
            if record.path.len() < 2 {
                debug!(name = record.name.as_str(), points = record.path.len(), "train_definition_without_route");
            }
            self.spawn_train(&record.name, &record.train_name, service, &record.path);
            summary.loaded += 1;
        }
        self.document = document;

        info!(
            path = %path.display(),
            loaded = summary.loaded,
            skipped = summary.skipped,
            "trains_loaded"
        );
        Ok(summary)
    }

    pub(crate) fn persist(&self) -> Result<(), DefinitionsError> {
        let path = &self.config.definitions_path;
        write_document(path, &self.document)?;
        info!(
            path = %path.display(),
            records = self.document.trains.len(),
            "train_definitions_persisted"
        );
        Ok(())
    }

    pub(crate) fn update(&mut self, dt_seconds: f32) {
        for (name, train) in &mut self.trains {
            if train.advance(dt_seconds) == AdvanceOutcome::DegenerateSegment
                && train.take_degenerate_report()
            {
                warn!(
                    name = name.as_str(),
                    train_type = %train.train_type(),
                    segment = train.follower().current_segment(),
                    "train_stuck_on_zero_length_segment"
                );
            }
        }
    }

    pub(crate) fn draw(&self, renderer: &mut dyn SpriteRenderer) {
        for train in self.trains.values() {
            renderer.draw_sprite(
                train.texture(),
                train.position(),
                train.size(),
                train.rotation_degrees(),
            );
        }
    }

    pub(crate) fn train(&self, name: &str) -> Option<&Train> {
        self.trains.get(name)
    }

    pub(crate) fn trains(&self) -> impl Iterator<Item = (&str, &Train)> {
        self.trains.iter().map(|(name, train)| (name.as_str(), train))
    }

    pub(crate) fn len(&self) -> usize {
        self.trains.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    pub(crate) fn definitions(&self) -> &TrainDocument {
        &self.document
    }

    pub(crate) fn train_type_of(&self, train_name: &str) -> Option<TrainType> {
        self.services.get(train_name).map(|service| service.train_type)
    }

    fn is_name_taken(&self, name: &str) -> bool {
        self.trains.contains_key(name) || self.document.contains(name)
    }

    fn service(&self, train_name: &str) -> Result<ServiceTexture, RegistryError> {
        self.services
            .get(train_name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownTrainName {
                train_name: train_name.to_string(),
            })
    }

    fn spawn_train(&mut self, name: &str, train_name: &str, service: ServiceTexture, path: &[Vec2]) {
        let mut train = Train::new(service.texture, train_name, service.train_type, &self.config.spawn);
        train.set_path(path);
        self.trains.insert(name.to_string(), train);
    }
}
