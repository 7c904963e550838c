use serde::{Deserialize, Serialize};

/// Capabilities the middleware withholds for an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectRestriction {
    Delete,
    Relations,
    Details,
    TypeChange,
    LayoutChange,
    Template,
    Duplicate,
    /// Block content cannot be edited; the document renders read-only
    Blocks,
}

/// True when block editing is withheld
pub fn blocks_read_only(restrictions: &[ObjectRestriction]) -> bool {
    restrictions.contains(&ObjectRestriction::Blocks)
}
