mod definitions;
mod handler;
mod train;
mod train_type;

#[cfg(test)]
pub(crate) use definitions::DefinitionsError;
#[cfg(test)]
pub(crate) use handler::{LoadSummary, RegistryError};
pub(crate) use handler::{TrainHandler, TrainHandlerConfig};
pub(crate) use train::{SpawnTemplate, Train};
pub(crate) use train_type::TrainType;
