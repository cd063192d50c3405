mod background;
mod train_layer;

pub(crate) use background::BackgroundLayer;
pub(crate) use train_layer::TrainLayer;
