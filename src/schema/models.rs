//! Concrete resource models, one per discriminator.

use super::enums::{
    ContentRating, CustomListVisibility, LegacyType, PublicationDemographic, ReadingStatus, Status,
};
use super::localized::LocalizedString;
use super::search::{MAX_CHAPTER_NUMBER_LEN, MAX_CHAPTER_TITLE_LEN};
use super::{
    Relationship, Resource, ResourceBase, ResourceId, ResourceKind, TypedResource, nested_list,
    nested_option,
};
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Base URL cover images are served from.
pub const COVERS_BASE_URL: &str = "https://uploads.mangadex.org/covers";

macro_rules! typed_resource {
    ($($ty:ident => $kind:ident),+ $(,)?) => {
        $(
            impl TypedResource for $ty {
                const KIND: ResourceKind = ResourceKind::$kind;

                fn base(&self) -> &ResourceBase {
                    &self.base
                }

                fn into_resource(self) -> Resource {
                    Resource::$kind(self)
                }

                fn from_resource(resource: Resource) -> Result<Self, Resource> {
                    match resource {
                        Resource::$kind(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }

            impl ResourceId for $ty {
                fn resource_id(&self) -> &str {
                    &self.base.id
                }
            }
        )+
    };
}

typed_resource! {
    Author => Author,
    Chapter => Chapter,
    Manga => Manga,
    User => User,
    Tag => Tag,
    ScanlationGroup => ScanlationGroup,
    CustomList => CustomList,
    MappingId => MappingId,
    Cover => Cover,
    UploadSession => UploadSession,
    UploadSessionFile => UploadSessionFile,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub biography: LocalizedString,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(flatten)]
    pub base: ResourceBase,
    #[serde(default, deserialize_with = "chapter_title")]
    pub title: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "chapter_number")]
    pub chapter: Option<String>,
    #[serde(default)]
    pub translated_language: Option<String>,
    /// Image set hash used to build page URLs.
    #[serde(default)]
    pub hash: Option<String>,
    /// Page file names.
    #[serde(default)]
    pub data: Vec<String>,
    /// Compressed page file names.
    #[serde(default)]
    pub data_saver: Vec<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publish_at: Option<DateTime<Utc>>,
}

fn bounded<'de, D: Deserializer<'de>>(
    d: D,
    field: &str,
    max: usize,
) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(d)?;
    match &value {
        Some(s) if s.chars().count() > max => Err(de::Error::custom(format!(
            "{field} is longer than {max} characters"
        ))),
        _ => Ok(value),
    }
}

fn chapter_title<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    bounded(d, "chapter title", MAX_CHAPTER_TITLE_LEN)
}

fn chapter_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    bounded(d, "chapter number", MAX_CHAPTER_NUMBER_LEN)
}

impl Chapter {
    /// Scanlation groups credited for this chapter.
    pub fn groups(&self) -> Vec<&Relationship> {
        self.relations_to("scanlation_group")
    }

    pub fn manga(&self) -> Option<&Relationship> {
        self.relations_to("manga").into_iter().next()
    }

    pub fn uploader(&self) -> Option<&Relationship> {
        self.relations_to("user").into_iter().next()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub title: LocalizedString,
    #[serde(default)]
    pub alt_titles: Vec<LocalizedString>,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default, deserialize_with = "nested_list")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub last_volume: Option<String>,
    #[serde(default)]
    pub last_chapter: Option<String>,
    /// External site ids keyed by site code (`mal`, `al`, ...).
    #[serde(default)]
    pub links: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub publication_demographic: Option<PublicationDemographic>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub content_rating: Option<ContentRating>,
    #[serde(default)]
    pub reading_status: Option<ReadingStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Manga {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name.to_string()).collect()
    }

    pub fn authors(&self) -> Vec<&Relationship> {
        self.relations_to("author")
    }

    pub fn artists(&self) -> Vec<&Relationship> {
        self.relations_to("artist")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanlationGroup {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub name: String,
    #[serde(default, deserialize_with = "nested_option")]
    pub leader: Option<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomList {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub name: String,
    pub visibility: CustomListVisibility,
    #[serde(default, deserialize_with = "nested_option")]
    pub owner: Option<User>,
}

/// Mapping from a legacy numeric id to the current id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingId {
    #[serde(flatten)]
    pub base: ResourceBase,
    #[serde(rename = "type")]
    pub legacy_type: LegacyType,
    pub legacy_id: u64,
    pub new_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cover {
    #[serde(flatten)]
    pub base: ResourceBase,
    #[serde(default)]
    pub volume: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cover {
    pub fn manga(&self) -> Option<&Relationship> {
        self.relations_to("manga").into_iter().next()
    }

    /// Full-size image URL; needs the manga relationship.
    pub fn url(&self) -> Option<String> {
        self.manga()
            .map(|manga| format!("{COVERS_BASE_URL}/{}/{}", manga.id, self.file_name))
    }

    pub fn url_512(&self) -> Option<String> {
        self.url().map(|url| format!("{url}.512.jpg"))
    }

    pub fn url_256(&self) -> Option<String> {
        self.url().map(|url| format!("{url}.256.jpg"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub is_committed: bool,
    pub is_processed: bool,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionFile {
    #[serde(flatten)]
    pub base: ResourceBase,
    pub original_file_name: String,
    pub file_hash: String,
    pub file_size: u64,
    pub mime_type: String,
}
