use serde::{Deserialize, Serialize};

/// Object layout, stored in details as a numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectLayout {
    Basic,
    Profile,
    Todo,
    Set,
    ObjectType,
    Relation,
    File,
    Dashboard,
    Image,
    Note,
    Space,
    Bookmark,
    RelationOptionList,
    RelationOption,
    Collection,
    Audio,
    Video,
    Date,
    SpaceView,
    Participant,
    Pdf,
}

impl ObjectLayout {
    pub fn from_code(code: i64) -> Option<Self> {
        let layout = match code {
            0 => ObjectLayout::Basic,
            1 => ObjectLayout::Profile,
            2 => ObjectLayout::Todo,
            3 => ObjectLayout::Set,
            4 => ObjectLayout::ObjectType,
            5 => ObjectLayout::Relation,
            6 => ObjectLayout::File,
            7 => ObjectLayout::Dashboard,
            8 => ObjectLayout::Image,
            9 => ObjectLayout::Note,
            10 => ObjectLayout::Space,
            11 => ObjectLayout::Bookmark,
            12 => ObjectLayout::RelationOptionList,
            13 => ObjectLayout::RelationOption,
            14 => ObjectLayout::Collection,
            15 => ObjectLayout::Audio,
            16 => ObjectLayout::Video,
            17 => ObjectLayout::Date,
            18 => ObjectLayout::SpaceView,
            19 => ObjectLayout::Participant,
            20 => ObjectLayout::Pdf,
            _ => return None,
        };
        Some(layout)
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn is_file_family(self) -> bool {
        matches!(
            self,
            ObjectLayout::File
                | ObjectLayout::Image
                | ObjectLayout::Audio
                | ObjectLayout::Video
                | ObjectLayout::Pdf
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for code in 0..=20 {
            let layout = ObjectLayout::from_code(code).unwrap();
            assert_eq!(layout.code(), code);
        }
        assert_eq!(ObjectLayout::from_code(99), None);
    }
}
