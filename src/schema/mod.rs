//! Typed resources and the tagged decoder that builds them.
//!
//! Every resource arrives as `{id, type, attributes, relationships?}`. The
//! `type` discriminator selects a concrete model from a closed table; the
//! model is built from the identity fields merged with its attributes.

mod enums;
mod localized;
mod models;
mod search;

pub use enums::{
    ContentRating, CustomListVisibility, LegacyType, MultiMode, PublicationDemographic,
    ReadingStatus, SortOrder, Status,
};
pub use localized::{DEFAULT_LANGUAGE, LocalizedString};
pub use models::{
    Author, Chapter, Cover, CustomList, Manga, MappingId, ScanlationGroup, Tag, UploadSession,
    UploadSessionFile, User,
};
pub use search::{
    ChapterSearch, ChapterSortOrder, MAX_CHAPTER_NUMBER_LEN, MAX_CHAPTER_TITLE_LEN, MAX_YEAR,
    MangaSearch, MangaSortOrder, MIN_YEAR,
};

use crate::error::DecodeError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// A weak reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Present when the service expanded the reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<JsonValue>,
}

impl Relationship {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes: None,
        }
    }
}

/// Fields shared by every resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceBase {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, deserialize_with = "positive_version")]
    pub version: Option<u32>,
}

impl ResourceBase {
    /// Relationships whose discriminator is `kind`, in their original order.
    pub fn relations_to(&self, kind: &str) -> Vec<&Relationship> {
        self.relationships.iter().filter(|r| r.kind == kind).collect()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Relationship>, D::Error> {
    Ok(Option::<Vec<Relationship>>::deserialize(d)?.unwrap_or_default())
}

fn positive_version<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    match Option::<u32>::deserialize(d)? {
        Some(0) => Err(de::Error::custom("version must be at least 1")),
        other => Ok(other),
    }
}

/// Discriminator of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Author,
    Chapter,
    Manga,
    User,
    Tag,
    ScanlationGroup,
    CustomList,
    MappingId,
    Cover,
    UploadSession,
    UploadSessionFile,
}

impl ResourceKind {
    pub const ALL: &'static [ResourceKind] = &[
        ResourceKind::Author,
        ResourceKind::Chapter,
        ResourceKind::Manga,
        ResourceKind::User,
        ResourceKind::Tag,
        ResourceKind::ScanlationGroup,
        ResourceKind::CustomList,
        ResourceKind::MappingId,
        ResourceKind::Cover,
        ResourceKind::UploadSession,
        ResourceKind::UploadSessionFile,
    ];

    /// The wire discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Author => "author",
            ResourceKind::Chapter => "chapter",
            ResourceKind::Manga => "manga",
            ResourceKind::User => "user",
            ResourceKind::Tag => "tag",
            ResourceKind::ScanlationGroup => "scanlation_group",
            ResourceKind::CustomList => "custom_list",
            ResourceKind::MappingId => "mapping_id",
            ResourceKind::Cover => "cover_art",
            ResourceKind::UploadSession => "upload_session",
            ResourceKind::UploadSessionFile => "upload_session_file",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownResourceType(Some(s.to_string())))
    }
}

/// A decoded resource of any known kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Author(Author),
    Chapter(Chapter),
    Manga(Manga),
    User(User),
    Tag(Tag),
    ScanlationGroup(ScanlationGroup),
    CustomList(CustomList),
    MappingId(MappingId),
    Cover(Cover),
    UploadSession(UploadSession),
    UploadSessionFile(UploadSessionFile),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Author(_) => ResourceKind::Author,
            Resource::Chapter(_) => ResourceKind::Chapter,
            Resource::Manga(_) => ResourceKind::Manga,
            Resource::User(_) => ResourceKind::User,
            Resource::Tag(_) => ResourceKind::Tag,
            Resource::ScanlationGroup(_) => ResourceKind::ScanlationGroup,
            Resource::CustomList(_) => ResourceKind::CustomList,
            Resource::MappingId(_) => ResourceKind::MappingId,
            Resource::Cover(_) => ResourceKind::Cover,
            Resource::UploadSession(_) => ResourceKind::UploadSession,
            Resource::UploadSessionFile(_) => ResourceKind::UploadSessionFile,
        }
    }

    pub fn base(&self) -> &ResourceBase {
        match self {
            Resource::Author(r) => r.base(),
            Resource::Chapter(r) => r.base(),
            Resource::Manga(r) => r.base(),
            Resource::User(r) => r.base(),
            Resource::Tag(r) => r.base(),
            Resource::ScanlationGroup(r) => r.base(),
            Resource::CustomList(r) => r.base(),
            Resource::MappingId(r) => r.base(),
            Resource::Cover(r) => r.base(),
            Resource::UploadSession(r) => r.base(),
            Resource::UploadSessionFile(r) => r.base(),
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn version(&self) -> Option<u32> {
        self.base().version
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.base().relationships
    }

    pub fn relations_to(&self, kind: &str) -> Vec<&Relationship> {
        self.base().relations_to(kind)
    }
}

/// A concrete model that can be decoded from a raw resource.
pub trait TypedResource: Sized + for<'de> Deserialize<'de> {
    const KIND: ResourceKind;

    fn base(&self) -> &ResourceBase;

    fn into_resource(self) -> Resource;

    /// Returns the resource back when it is a different kind.
    fn from_resource(resource: Resource) -> Result<Self, Resource>;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn version(&self) -> Option<u32> {
        self.base().version
    }

    fn relationships(&self) -> &[Relationship] {
        &self.base().relationships
    }

    fn relations_to(&self, kind: &str) -> Vec<&Relationship> {
        self.base().relations_to(kind)
    }
}

/// Anything a cursor or request can decode elements into.
pub trait Decode: Sized {
    fn decode(raw: &JsonValue) -> Result<Self, DecodeError>;
}

impl Decode for Resource {
    fn decode(raw: &JsonValue) -> Result<Self, DecodeError> {
        decode(raw)
    }
}

impl<T: TypedResource> Decode for T {
    fn decode(raw: &JsonValue) -> Result<Self, DecodeError> {
        decode_as(raw)
    }
}

/// Something that identifies a resource: an id string or a resource itself.
pub trait ResourceId {
    fn resource_id(&self) -> &str;
}

impl ResourceId for str {
    fn resource_id(&self) -> &str {
        self
    }
}

impl ResourceId for String {
    fn resource_id(&self) -> &str {
        self
    }
}

impl ResourceId for Relationship {
    fn resource_id(&self) -> &str {
        &self.id
    }
}

impl ResourceId for Resource {
    fn resource_id(&self) -> &str {
        self.id()
    }
}

impl<T: ResourceId + ?Sized> ResourceId for &T {
    fn resource_id(&self) -> &str {
        (**self).resource_id()
    }
}

type Constructor = fn(JsonValue) -> Result<Resource, DecodeError>;

/// Discriminator → constructor mapping. Closed: anything else fails to decode.
static TYPE_TABLE: &[(&str, Constructor)] = &[
    ("author", construct::<Author>),
    ("chapter", construct::<Chapter>),
    ("manga", construct::<Manga>),
    ("user", construct::<User>),
    ("tag", construct::<Tag>),
    ("scanlation_group", construct::<ScanlationGroup>),
    ("custom_list", construct::<CustomList>),
    ("mapping_id", construct::<MappingId>),
    ("cover_art", construct::<Cover>),
    ("upload_session", construct::<UploadSession>),
    ("upload_session_file", construct::<UploadSessionFile>),
];

static TYPE_REGISTRY: LazyLock<HashMap<&'static str, Constructor>> =
    LazyLock::new(|| TYPE_TABLE.iter().copied().collect());

fn construct<T: TypedResource>(merged: JsonValue) -> Result<Resource, DecodeError> {
    serde_json::from_value::<T>(merged)
        .map(TypedResource::into_resource)
        .map_err(|e| DecodeError::SchemaViolation {
            kind: T::KIND.as_str(),
            message: e.to_string(),
        })
}

/// Checks that the type table has exactly one entry per [`ResourceKind`]
/// and that each entry builds the kind it is registered under.
pub fn validate_type_table() -> Result<(), DecodeError> {
    let mut seen = HashSet::new();
    for (discriminator, _) in TYPE_TABLE {
        if !seen.insert(*discriminator) {
            return Err(DecodeError::DuplicateResourceType(*discriminator));
        }
        if discriminator.parse::<ResourceKind>().is_err() {
            return Err(DecodeError::UnknownResourceType(Some(discriminator.to_string())));
        }
    }

    for kind in ResourceKind::ALL {
        if !seen.contains(kind.as_str()) {
            return Err(DecodeError::MissingResourceType(kind.as_str()));
        }
    }

    Ok(())
}

/// Decodes a raw resource object into its typed model.
pub fn decode(raw: &JsonValue) -> Result<Resource, DecodeError> {
    let discriminator = raw.get("type").and_then(JsonValue::as_str);
    let constructor = discriminator
        .and_then(|d| TYPE_REGISTRY.get(d))
        .ok_or_else(|| DecodeError::UnknownResourceType(discriminator.map(str::to_string)))?;

    let kind = discriminator
        .and_then(|d| d.parse::<ResourceKind>().ok())
        .map_or("resource", ResourceKind::as_str);

    let mut merged = Map::new();
    merged.insert(
        "id".to_string(),
        raw.get("id").cloned().unwrap_or(JsonValue::Null),
    );
    merged.insert(
        "relationships".to_string(),
        raw.get("relationships")
            .cloned()
            .unwrap_or_else(|| JsonValue::Array(Vec::new())),
    );
    merged.insert(
        "version".to_string(),
        raw.get("version").cloned().unwrap_or(JsonValue::Null),
    );

    match raw.get("attributes") {
        Some(JsonValue::Object(attributes)) => {
            merged.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        None | Some(JsonValue::Null) => {}
        Some(other) => {
            return Err(DecodeError::SchemaViolation {
                kind,
                message: format!("attributes must be an object, got {other}"),
            });
        }
    }

    constructor(JsonValue::Object(merged))
}

/// Decodes a raw resource and requires it to be a `T`.
pub fn decode_as<T: TypedResource>(raw: &JsonValue) -> Result<T, DecodeError> {
    T::from_resource(decode(raw)?).map_err(|other| DecodeError::UnexpectedResourceType {
        expected: T::KIND.as_str(),
        found: other.kind().as_str(),
    })
}

/// Deserializes a list of nested raw resources, e.g. a manga's tags.
pub(crate) fn nested_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TypedResource,
{
    let raw = Option::<Vec<JsonValue>>::deserialize(d)?.unwrap_or_default();
    raw.iter()
        .map(|item| decode_as::<T>(item).map_err(de::Error::custom))
        .collect()
}

/// Deserializes an optional nested raw resource, e.g. a group's leader.
pub(crate) fn nested_option<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TypedResource,
{
    match Option::<JsonValue>::deserialize(d)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(raw) => decode_as::<T>(&raw).map(Some).map_err(de::Error::custom),
    }
}
