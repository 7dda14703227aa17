use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    response::{Html, IntoResponse, Redirect},
};

use tracing::info;

use crate::api::{APIResponse, BookForm};
use crate::db::{Books, Database};
use crate::error::{DbError, HandlerError};
use crate::model::{Book, NewBook, parse_date};
use crate::views;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db: Arc::new(db) }
    }
}

fn parse_book_id(raw: &str) -> Result<i64, HandlerError> {
    raw.parse::<i64>()
        .map_err(|e| HandlerError::bad_request(&format!("Invalid book ID {:?}", raw), &e))
}

type FormPairs = Vec<(String, String)>;

fn read_form(form: Result<Form<FormPairs>, FormRejection>) -> Result<BookForm, HandlerError> {
    form.map(|Form(pairs)| BookForm::from_pairs(pairs))
        .map_err(|e| HandlerError::bad_request("Error parsing form data", &e))
}

fn new_book(form: BookForm) -> Result<NewBook, HandlerError> {
    let published_date = parse_date(&form.published_date)
        .map_err(|e| HandlerError::bad_request("Invalid date format", &e))?;

    Ok(NewBook {
        title: form.title,
        author: form.author,
        published_date,
    })
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::new("ok"))
}

pub async fn list_books(State(state): State<AppState>) -> Result<Html<String>, HandlerError> {
    let books = Books::new(state.db.connection())
        .get_all()
        .await
        .map_err(|e| HandlerError::internal("Error listing books", &e))?;

    info!(count = books.len(), "listed books");
    Ok(views::render_index(&books))
}

pub async fn add_book(
    State(state): State<AppState>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> Result<Redirect, HandlerError> {
    let book = new_book(read_form(form)?)?;

    Books::new(state.db.connection())
        .create(book)
        .await
        .map_err(|e| HandlerError::internal("Error adding book to the database", &e))?;

    info!("added book");
    Ok(Redirect::to("/"))
}

pub async fn edit_book_form(
    State(state): State<AppState>,
    params: Result<Query<FormPairs>, QueryRejection>,
) -> Result<Html<String>, HandlerError> {
    let Query(pairs) = params.map_err(|e| HandlerError::bad_request("Invalid query", &e))?;
    let params = BookForm::from_pairs(pairs);
    let id = parse_book_id(&params.book_id)?;

    let book = Books::new(state.db.connection())
        .get_one(id)
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) | DbError::InvalidDate { .. } => HandlerError::not_found("Book not found", &e),
            DbError::Store(_) => HandlerError::internal("Error reading book", &e),
        })?;

    Ok(views::render_update(&book))
}

pub async fn update_book(
    State(state): State<AppState>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> Result<Redirect, HandlerError> {
    let form = read_form(form)?;
    let id = parse_book_id(&form.book_id)?;
    let book: Book = new_book(form)?.with_id(id);

    Books::new(state.db.connection())
        .update(book)
        .await
        .map_err(|e| HandlerError::internal("Error updating book in the database", &e))?;

    info!(book_id = id, "updated book");
    Ok(Redirect::to("/"))
}

pub async fn delete_book(
    State(state): State<AppState>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> Result<Redirect, HandlerError> {
    let id = parse_book_id(&read_form(form)?.book_id)?;

    Books::new(state.db.connection())
        .delete(id)
        .await
        .map_err(|e| HandlerError::internal("Error deleting book from the database", &e))?;

    info!(book_id = id, "deleted book");
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_book_id() {
        assert_eq!(parse_book_id("42").unwrap(), 42);
        assert_eq!(parse_book_id("+7").unwrap(), 7);
        assert!(parse_book_id("").is_err());
        assert!(parse_book_id("abc").is_err());
        assert!(parse_book_id("1.5").is_err());
        assert!(parse_book_id(" 1").is_err());
    }

    #[test]
    fn test_new_book_requires_iso_date() {
        let form = BookForm {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            published_date: "08/01/1965".to_string(),
            ..Default::default()
        };
        let err = new_book(form).unwrap_err();
        assert!(matches!(err, HandlerError::BadRequest(_)));
    }
}
