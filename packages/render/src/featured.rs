//! Featured relations row.
//!
//! Keys come from the object's own `featuredRelations` list, falling back to
//! the recommended featured relations of its type (or of the template's
//! target type). The object type resolves against the type store, backlinks
//! and links render as counts of objects known to details.

use crate::naming::ObjectNaming;
use crate::relation_view::{relation_view_for, ObjectRelationView};
use crate::renderer::RenderWarning;
use blocktree_model::{
    keys, ObjectRecord, ObjectTypeIndex, ObjectTypeRecord, ObjectViewDetails, RelationIndex,
};
use std::collections::BTreeSet;
use tracing::warn;

pub struct FeaturedSources<'a> {
    pub details: &'a ObjectViewDetails,
    pub relations: &'a RelationIndex,
    pub object_types: &'a ObjectTypeIndex,
    pub naming: &'a ObjectNaming,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Featured {
    pub relations: Vec<ObjectRelationView>,
    /// Object lists featured relations that differ from its type's defaults
    pub conflict: bool,
    pub warnings: Vec<RenderWarning>,
}

impl<'a> FeaturedSources<'a> {
    fn object_type(&self, id: &str) -> Option<ObjectTypeRecord<'a>> {
        self.object_types
            .by_id(id)
            .or_else(|| self.details.get(id).map(ObjectTypeRecord::new))
    }

    fn recommended_keys(&self, object_type: Option<ObjectTypeRecord<'_>>) -> Vec<String> {
        object_type
            .map(|ty| ty.recommended_featured_relations())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.relations.by_id(id).and_then(|r| r.key()))
            .map(str::to_string)
            .collect()
    }

    /// Resolves the featured row for `object_id`
    pub fn resolve(&self, object_id: &str) -> Featured {
        let mut featured = Featured::default();
        let Some(object) = self.details.object(object_id) else {
            return featured;
        };

        let type_id = object.type_id();
        let object_type = type_id.as_deref().and_then(|id| self.object_type(id));
        let defaults_from = match object_type {
            Some(ty) if ty.is_template() => object
                .target_object_type()
                .and_then(|target| self.object_type(target)),
            other => other,
        };

        let listed = object.featured_relations();
        let recommended = self.recommended_keys(defaults_from);
        featured.conflict = !listed.is_empty()
            && object_type.is_some()
            && listed.iter().collect::<BTreeSet<_>>() != recommended.iter().collect::<BTreeSet<_>>();

        let source = if listed.is_empty() { recommended } else { listed };
        let mut seen = BTreeSet::new();
        for key in source {
            if key == keys::DESCRIPTION || !seen.insert(key.clone()) {
                continue;
            }
            if let Some(view) = self.relation(&object, &key, type_id.as_deref(), &mut featured.warnings)
            {
                featured.relations.push(view);
            }
        }
        featured
    }

    fn relation(
        &self,
        object: &ObjectRecord<'_>,
        key: &str,
        type_id: Option<&str>,
        warnings: &mut Vec<RenderWarning>,
    ) -> Option<ObjectRelationView> {
        let definition = self.relations.by_key(key);
        let id = definition
            .and_then(|d| d.id())
            .unwrap_or(key)
            .to_string();
        let label = definition
            .map(|d| d.name().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| key.to_string());

        match key {
            keys::TYPE => {
                let resolved = type_id
                    .and_then(|id| self.object_type(id))
                    .filter(|ty| !ty.is_deleted());
                Some(match (resolved, type_id) {
                    (Some(ty), Some(type_id)) => ObjectRelationView::ObjectTypeBase {
                        id,
                        key: key.to_string(),
                        name: self.naming.type_name(&ty),
                        type_id: type_id.to_string(),
                    },
                    _ => {
                        if let Some(type_id) = type_id {
                            warnings.push(RenderWarning::MissingObjectType {
                                id: type_id.to_string(),
                            });
                        }
                        ObjectRelationView::ObjectTypeDeleted {
                            id,
                            key: key.to_string(),
                            type_id: type_id.map(str::to_string),
                        }
                    }
                })
            }
            keys::BACKLINKS | keys::LINKS => {
                let targets = if key == keys::BACKLINKS {
                    object.backlinks()
                } else {
                    object.links()
                };
                let count = targets
                    .iter()
                    .filter(|target| self.details.contains(target))
                    .count();
                if count == 0 {
                    return None;
                }
                let key = key.to_string();
                Some(if key == keys::BACKLINKS {
                    ObjectRelationView::LinksBacklinks { id, key, name: label, count }
                } else {
                    ObjectRelationView::LinksFrom { id, key, name: label, count }
                })
            }
            _ => {
                let Some(definition) = definition.filter(|d| !d.is_deleted()) else {
                    warn!(key, "Featured relation missing from relation store");
                    warnings.push(RenderWarning::MissingRelation {
                        key: key.to_string(),
                    });
                    return None;
                };
                relation_view_for(&definition, object, self.details, self.naming)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktree_model::{ObjectTypeStore, RelationFormat, RelationStore, Struct};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn record(value: Value) -> Struct {
        serde_json::from_value(value).unwrap()
    }

    struct Fixture {
        details: ObjectViewDetails,
        relations: RelationStore,
        types: ObjectTypeStore,
        naming: ObjectNaming,
    }

    impl Fixture {
        fn new(object: Value) -> Self {
            let relations = RelationStore::new();
            relations.merge(vec![
                record(json!({ "id": "rel-type", "relationKey": "type", "name": "Object type", "relationFormat": 100 })),
                record(json!({ "id": "rel-status", "relationKey": "status", "name": "Status", "relationFormat": 1 })),
                record(json!({ "id": "rel-backlinks", "relationKey": "backlinks", "name": "Backlinks", "relationFormat": 100 })),
            ]);
            let types = ObjectTypeStore::new();
            types.merge(vec![
                record(json!({ "id": "t-page", "uniqueKey": "ot-page", "name": "Page",
                    "recommendedFeaturedRelations": ["rel-type", "rel-backlinks"] })),
                record(json!({ "id": "t-template", "uniqueKey": "ot-template", "name": "Template" })),
                record(json!({ "id": "t-task", "uniqueKey": "ot-task", "name": "Task",
                    "recommendedFeaturedRelations": ["rel-status"] })),
            ]);
            Self {
                details: ObjectViewDetails::new().with("obj", record(object)),
                relations,
                types,
                naming: ObjectNaming::default(),
            }
        }

        fn resolve(&self) -> Featured {
            let relations = self.relations.snapshot();
            let types = self.types.snapshot();
            FeaturedSources {
                details: &self.details,
                relations: &relations,
                object_types: &types,
                naming: &self.naming,
            }
            .resolve("obj")
        }
    }

    #[test]
    fn test_explicit_keys_with_type_and_text_relation() {
        let fixture = Fixture::new(json!({
            "id": "obj", "type": "t-page", "featuredRelations": ["type", "status"], "status": "Draft"
        }));
        let featured = fixture.resolve();
        assert_eq!(
            featured.relations,
            vec![
                ObjectRelationView::ObjectTypeBase {
                    id: "rel-type".into(),
                    key: "type".into(),
                    name: "Page".into(),
                    type_id: "t-page".into(),
                },
                ObjectRelationView::Default {
                    id: "rel-status".into(),
                    key: "status".into(),
                    name: "Status".into(),
                    value: Some("Draft".into()),
                    format: RelationFormat::ShortText,
                },
            ]
        );
        assert!(featured.conflict);
    }

    #[test]
    fn test_falls_back_to_type_recommendations_without_conflict() {
        let mut fixture = Fixture::new(json!({ "id": "obj", "type": "t-page", "backlinks": ["a", "b", "c"] }));
        fixture.details.set("a", record(json!({ "id": "a" })));
        fixture.details.set("b", record(json!({ "id": "b" })));

        let featured = fixture.resolve();
        assert_eq!(featured.relations.len(), 2);
        assert_eq!(
            featured.relations[1],
            ObjectRelationView::LinksBacklinks {
                id: "rel-backlinks".into(),
                key: "backlinks".into(),
                name: "Backlinks".into(),
                count: 2,
            }
        );
        assert!(!featured.conflict);
    }

    #[test]
    fn test_deleted_or_missing_type() {
        let fixture = Fixture::new(json!({
            "id": "obj", "type": "t-gone", "featuredRelations": ["type"]
        }));
        let featured = fixture.resolve();
        assert_eq!(
            featured.relations,
            vec![ObjectRelationView::ObjectTypeDeleted {
                id: "rel-type".into(),
                key: "type".into(),
                type_id: Some("t-gone".into()),
            }]
        );
        assert_eq!(
            featured.warnings,
            vec![RenderWarning::MissingObjectType { id: "t-gone".into() }]
        );
    }

    #[test]
    fn test_template_uses_target_type_defaults() {
        let fixture = Fixture::new(json!({
            "id": "obj", "type": "t-template", "targetObjectType": "t-task", "status": "Open"
        }));
        let featured = fixture.resolve();
        assert_eq!(featured.relations.len(), 1);
        assert_eq!(featured.relations[0].key(), "status");
    }

    #[test]
    fn test_zero_counts_and_unknown_keys_are_dropped() {
        let fixture = Fixture::new(json!({
            "id": "obj", "type": "t-page", "featuredRelations": ["backlinks", "mystery"], "backlinks": ["x"]
        }));
        let featured = fixture.resolve();
        assert!(featured.relations.is_empty());
        assert_eq!(
            featured.warnings,
            vec![RenderWarning::MissingRelation { key: "mystery".into() }]
        );
    }
}
