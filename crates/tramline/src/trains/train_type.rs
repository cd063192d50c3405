use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) enum TrainType {
    #[default]
    Undefined,
    Tram,
    LightRail,
    Subway,
    Commuter,
    Freight,
}

/// Persisted names. The texture naming convention uses the same spelling for its prefix.
const TYPE_NAMES: [(TrainType, &str); 6] = [
    (TrainType::Undefined, "undefined"),
    (TrainType::Tram, "tram"),
    (TrainType::LightRail, "lightrail"),
    (TrainType::Subway, "subway"),
    (TrainType::Commuter, "commuter"),
    (TrainType::Freight, "freight"),
];

impl TrainType {
    pub(crate) fn name(self) -> &'static str {
        TYPE_NAMES
            .iter()
            .find(|(train_type, _)| *train_type == self)
            .map(|(_, name)| *name)
            .unwrap_or("undefined")
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        TYPE_NAMES
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(train_type, _)| *train_type)
    }

    /// Maps a texture file prefix. Anything unrecognised, including `undefined`, counts as
    /// freight.
    pub(crate) fn from_texture_prefix(prefix: &str) -> Self {
        match Self::from_name(prefix) {
            Some(TrainType::Undefined) | None => TrainType::Freight,
            Some(train_type) => train_type,
        }
    }
}

impl fmt::Display for TrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TrainType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.name().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TrainType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        TrainType::from_name(&name).ok_or_else(|| D::Error::unknown_variant(&name, &TYPE_NAME_LIST))
    }
}

const TYPE_NAME_LIST: [&str; 6] = [
    TYPE_NAMES[0].1,
    TYPE_NAMES[1].1,
    TYPE_NAMES[2].1,
    TYPE_NAMES[3].1,
    TYPE_NAMES[4].1,
    TYPE_NAMES[5].1,
];
