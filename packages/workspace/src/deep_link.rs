//! Deep link resolution
//!
//! Turns an incoming link into the action the client should take. Links
//! that do not match a known shape resolve to [`DeepLinkAction::Unknown`]
//! instead of failing.
//!
//! | Link | Action |
//! |---|---|
//! | `anytype://main/import/?type=T&source=S` | `Import` |
//! | `anytype://object?objectId=O&spaceId=S[&inviteId=CID#KEY]` | `DeepLinkToObject` |
//! | `https://object.any.coop/O?spaceId=S[&inviteId=CID#KEY]` | `DeepLinkToObject` |
//! | `https://invite.any.coop/CID#KEY` | `Invite` |

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

const SCHEME: &str = "anytype";
const OBJECT_WEB_HOST: &str = "object.any.coop";
const INVITE_WEB_HOST: &str = "invite.any.coop";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DeepLinkAction {
    Import {
        #[serde(rename = "type")]
        kind: String,
        source: String,
    },
    DeepLinkToObject {
        space: String,
        object: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        invite: Option<Invite>,
    },
    /// Space invite, handed over as the original link
    Invite {
        link: String,
    },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub cid: String,
    /// Encryption key carried in the link fragment
    pub key: String,
}

/// Resolve a link into an action
pub fn resolve(link: &str) -> DeepLinkAction {
    let Ok(url) = Url::parse(link) else {
        debug!(link, "Unparseable deep link");
        return DeepLinkAction::Unknown;
    };

    let action = match (url.scheme(), url.host_str()) {
        (SCHEME, Some("main")) if url.path().trim_matches('/') == "import" => import(&url),
        (SCHEME, Some("object")) => object(&url, query(&url, "objectId")),
        ("https", Some(OBJECT_WEB_HOST)) => {
            let object_id = url
                .path_segments()
                .and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
                .map(str::to_string);
            object(&url, object_id)
        }
        ("https", Some(INVITE_WEB_HOST)) => match url.fragment() {
            Some(key) if !key.is_empty() => Some(DeepLinkAction::Invite {
                link: link.to_string(),
            }),
            _ => None,
        },
        _ => None,
    };

    action.unwrap_or_else(|| {
        debug!(link, "Unrecognized deep link");
        DeepLinkAction::Unknown
    })
}

fn import(url: &Url) -> Option<DeepLinkAction> {
    Some(DeepLinkAction::Import {
        kind: query(url, "type")?,
        source: query(url, "source")?,
    })
}

fn object(url: &Url, object_id: Option<String>) -> Option<DeepLinkAction> {
    let object = object_id.filter(|id| !id.is_empty())?;
    let space = query(url, "spaceId").filter(|id| !id.is_empty())?;

    // The invite key follows `#`, so it arrives as the URL fragment
    let invite = match (query(url, "inviteId"), url.fragment()) {
        (Some(cid), Some(key)) if !cid.is_empty() && !key.is_empty() => Some(Invite {
            cid,
            key: key.to_string(),
        }),
        _ => None,
    };

    Some(DeepLinkAction::DeepLinkToObject {
        space,
        object,
        invite,
    })
}

fn query(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_import_link() {
        assert_eq!(
            resolve("anytype://main/import/?type=experience123&source=source321"),
            DeepLinkAction::Import {
                kind: "experience123".into(),
                source: "source321".into(),
            }
        );
    }

    #[test]
    fn test_import_link_without_source_is_unknown() {
        assert_eq!(
            resolve("anytype://main/import/?type=experience123"),
            DeepLinkAction::Unknown
        );
    }

    #[test]
    fn test_object_link() {
        assert_eq!(
            resolve("anytype://object?objectId=obj1&spaceId=space1"),
            DeepLinkAction::DeepLinkToObject {
                space: "space1".into(),
                object: "obj1".into(),
                invite: None,
            }
        );
    }

    #[test]
    fn test_object_link_with_invite() {
        assert_eq!(
            resolve("anytype://object?objectId=obj1&spaceId=space1&inviteId=cid1#key1"),
            DeepLinkAction::DeepLinkToObject {
                space: "space1".into(),
                object: "obj1".into(),
                invite: Some(Invite {
                    cid: "cid1".into(),
                    key: "key1".into(),
                }),
            }
        );
    }

    #[test]
    fn test_web_object_link() {
        assert_eq!(
            resolve("https://object.any.coop/obj1?spaceId=space1"),
            DeepLinkAction::DeepLinkToObject {
                space: "space1".into(),
                object: "obj1".into(),
                invite: None,
            }
        );
        assert_eq!(
            resolve("https://object.any.coop/obj1?spaceId=space1&inviteId=cid1#key1"),
            DeepLinkAction::DeepLinkToObject {
                space: "space1".into(),
                object: "obj1".into(),
                invite: Some(Invite {
                    cid: "cid1".into(),
                    key: "key1".into(),
                }),
            }
        );
    }

    #[test]
    fn test_object_link_without_space_is_unknown() {
        assert_eq!(resolve("anytype://object?objectId=obj1"), DeepLinkAction::Unknown);
    }

    #[test]
    fn test_invite_link_keeps_original() {
        let link = "https://invite.any.coop/bafybeibqdqtd65nlaey3mnkf24prpeq#DsESM2H2xi7Fs96XSp6YcaKaXASX";
        assert_eq!(
            resolve(link),
            DeepLinkAction::Invite {
                link: link.to_string()
            }
        );
    }

    #[test]
    fn test_unrecognized_links() {
        assert_eq!(resolve("anytype://some_random_path"), DeepLinkAction::Unknown);
        assert_eq!(resolve("https://example.com/obj1?spaceId=s"), DeepLinkAction::Unknown);
        assert_eq!(resolve("not a link"), DeepLinkAction::Unknown);
    }

    #[test]
    fn test_action_serializes_tagged() {
        let json = serde_json::to_value(resolve("anytype://main/import/?type=t&source=s")).unwrap();
        assert_eq!(json, serde_json::json!({"action": "import", "type": "t", "source": "s"}));
    }
}
