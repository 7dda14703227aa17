use serde::Serialize;

/// Fields posted by the add and edit pages, or sent in the edit page query.
///
/// Built from the raw key/value pairs so that a repeated field keeps its first
/// value and an absent one is an empty string, leaving `book_id` and
/// `published_date` to be validated by the handler.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BookForm {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub published_date: String,
}

impl BookForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = BookForm::default();
        let mut seen = [false; 4];

        for (key, value) in pairs {
            let (slot, field) = match key.as_str() {
                "book_id" => (0, &mut form.book_id),
                "title" => (1, &mut form.title),
                "author" => (2, &mut form.author),
                "published_date" => (3, &mut form.published_date),
                _ => continue,
            };
            if !seen[slot] {
                seen[slot] = true;
                *field = value;
            }
        }

        form
    }
}

#[derive(Debug, Serialize, Default)]
pub struct APIResponse {
    pub status: String,
}

impl APIResponse {
    pub fn new(msg: &str) -> Self {
        APIResponse {
            status: msg.to_owned(),
        }
    }
}
