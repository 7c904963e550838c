use serde::{Deserialize, Serialize};

/// Well-known relation keys read by the engine.
pub mod keys {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const LAYOUT: &str = "resolvedLayout";
    pub const LEGACY_LAYOUT: &str = "layout";
    pub const DESCRIPTION: &str = "description";
    pub const SNIPPET: &str = "snippet";
    pub const FILE_EXT: &str = "fileExt";
    pub const TIMESTAMP: &str = "timestamp";
    pub const DONE: &str = "done";
    pub const ICON_EMOJI: &str = "iconEmoji";
    pub const ICON_IMAGE: &str = "iconImage";
    pub const IS_DELETED: &str = "isDeleted";
    pub const IS_ARCHIVED: &str = "isArchived";
    pub const IS_HIDDEN: &str = "isHidden";
    pub const FEATURED_RELATIONS: &str = "featuredRelations";
    pub const BACKLINKS: &str = "backlinks";
    pub const LINKS: &str = "links";
    pub const TARGET_OBJECT_TYPE: &str = "targetObjectType";
    pub const UNIQUE_KEY: &str = "uniqueKey";
    pub const RECOMMENDED_RELATIONS: &str = "recommendedRelations";
    pub const RECOMMENDED_FEATURED_RELATIONS: &str = "recommendedFeaturedRelations";
    pub const RELATION_KEY: &str = "relationKey";
    pub const RELATION_FORMAT: &str = "relationFormat";
    pub const RELATION_OPTION_COLOR: &str = "relationOptionColor";
    pub const COVER_TYPE: &str = "coverType";
    pub const COVER_ID: &str = "coverId";
    pub const LAST_OPENED_DATE: &str = "lastOpenedDate";
}

/// Unique key of the template object type.
pub const TEMPLATE_TYPE_KEY: &str = "ot-template";

/// Value format of a relation definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationFormat {
    LongText,
    ShortText,
    Number,
    Status,
    Date,
    File,
    Checkbox,
    Url,
    Email,
    Phone,
    Emoji,
    Tag,
    Object,
    Relations,
    Undefined,
}

impl RelationFormat {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => RelationFormat::LongText,
            1 => RelationFormat::ShortText,
            2 => RelationFormat::Number,
            3 => RelationFormat::Status,
            4 => RelationFormat::Date,
            5 => RelationFormat::File,
            6 => RelationFormat::Checkbox,
            7 => RelationFormat::Url,
            8 => RelationFormat::Email,
            9 => RelationFormat::Phone,
            10 => RelationFormat::Emoji,
            11 => RelationFormat::Tag,
            100 => RelationFormat::Object,
            101 => RelationFormat::Relations,
            _ => RelationFormat::Undefined,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            RelationFormat::LongText => 0,
            RelationFormat::ShortText => 1,
            RelationFormat::Number => 2,
            RelationFormat::Status => 3,
            RelationFormat::Date => 4,
            RelationFormat::File => 5,
            RelationFormat::Checkbox => 6,
            RelationFormat::Url => 7,
            RelationFormat::Email => 8,
            RelationFormat::Phone => 9,
            RelationFormat::Emoji => 10,
            RelationFormat::Tag => 11,
            RelationFormat::Object => 100,
            RelationFormat::Relations => 101,
            RelationFormat::Undefined => -1,
        }
    }
}
