//! DTOs for the rooms_sea adapter.

#[derive(Debug, Clone)]
pub struct RoomCreate {
    pub code: String,
    pub document: String,
}

impl RoomCreate {
    pub fn new(code: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            document: document.into(),
        }
    }
}

/// Document write. `current_version: None` overwrites without a version check.
#[derive(Debug, Clone)]
pub struct RoomDocumentUpdate {
    pub code: String,
    pub document: String,
    pub current_version: Option<i32>,
}

impl RoomDocumentUpdate {
    pub fn overwrite(code: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            document: document.into(),
            current_version: None,
        }
    }

    pub fn expecting(mut self, version: i32) -> Self {
        self.current_version = Some(version);
        self
    }
}
