use crate::domain::entities::filters::ANY_OPTION;

/// Reference lists feeding the selectors of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownData {
    pub providers: Vec<String>,
    pub countries: Vec<String>,
    /// Always starts with the "(Any)" sentinel.
    pub regions: Vec<String>,
}

impl Default for DropdownData {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            countries: Vec::new(),
            regions: vec![ANY_OPTION.to_string()],
        }
    }
}
