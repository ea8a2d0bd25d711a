/// REST resource map
///
/// Each row becomes one route per resource-mapped controller.

/// One conventional REST route: method, action and whether it takes an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMapping {
    pub action: String,
    pub method: String,
    pub id: bool,
}

impl ResourceMapping {
    pub fn new(action: impl Into<String>, method: impl Into<String>, id: bool) -> Self {
        Self {
            action: action.into(),
            method: method.into(),
            id,
        }
    }
}

/// The conventional table, in connection order
pub fn default_resource_map() -> Vec<ResourceMapping> {
    vec![
        ResourceMapping::new("index", "GET", false),
        ResourceMapping::new("view", "GET", true),
        ResourceMapping::new("add", "POST", false),
        ResourceMapping::new("edit", "PUT", true),
        ResourceMapping::new("delete", "DELETE", true),
        ResourceMapping::new("edit", "POST", true),
    ]
}
